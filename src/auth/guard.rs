//! `RequireSession` extractor

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use std::sync::Arc;

use super::Session;
use crate::api::{ApiError, AppState};

/// Where clients are sent when the session is gone
pub const LOGIN_PAGE: &str = "/auth";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Token from `Authorization: Bearer <token>`, or from the
/// `access_token` query parameter (browsers cannot set headers on
/// websocket upgrades)
pub fn bearer_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.access_token)
    })
}

/// A request made inside a live operator session
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);

        state
            .sessions
            .validate(token.as_deref())
            .await
            .map(RequireSession)
            .map_err(|e| {
                tracing::debug!(path = %parts.uri.path(), error = %e, "Session required");
                ApiError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn test_token_from_header() {
        let p = parts(
            Request::builder()
                .uri("/api/v1/cars")
                .header(AUTHORIZATION, "Bearer abc123")
                .body(())
                .unwrap(),
        );
        assert_eq!(bearer_token(&p).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_token_from_query() {
        let p = parts(
            Request::builder()
                .uri("/api/v1/ws?access_token=xyz&topics=carros")
                .body(())
                .unwrap(),
        );
        assert_eq!(bearer_token(&p).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let p = parts(
            Request::builder()
                .uri("/api/v1/cars")
                .header(AUTHORIZATION, "Basic Zm9vOmJhcg==")
                .body(())
                .unwrap(),
        );
        assert!(bearer_token(&p).is_none());
    }
}
