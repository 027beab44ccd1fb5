//! In-memory operator sessions

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AuthError;
use crate::config::{AuthConfig, OperatorConfig};

/// Email reported for requests when the guard is disabled
pub const ANONYMOUS: &str = "anonymous";

/// An open operator session
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn anonymous() -> Self {
        let now = Utc::now();
        Self {
            token: String::new(),
            email: ANONYMOUS.to_string(),
            created_at: now,
            expires_at: now + Duration::days(36_500),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide session table
pub struct SessionStore {
    enabled: bool,
    ttl: Duration,
    operators: Vec<OperatorConfig>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(config: &AuthConfig) -> Self {
        if config.enabled && config.operators.is_empty() {
            tracing::warn!("Session guard enabled but no operators configured; nobody can log in");
        }

        Self {
            enabled: config.enabled,
            ttl: Duration::hours(config.session_ttl_hours.max(1)),
            operators: config.operators.clone(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Open a session for a configured operator
    pub async fn login(&self, email: &str, access_key: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let known = self
            .operators
            .iter()
            .any(|op| op.email.eq_ignore_ascii_case(email) && op.access_key == access_key);

        if !known {
            tracing::warn!(email = %email, "Rejected login");
            return Err(AuthError::BadCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            email: email.to_lowercase(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());

        tracing::info!(email = %session.email, "Operator logged in");
        Ok(session)
    }

    /// Close a session. Returns whether it existed.
    pub async fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = &removed {
            tracing::info!(email = %session.email, "Operator logged out");
        }
        removed.is_some()
    }

    /// Resolve a token to a live session. With the guard disabled every
    /// request gets an anonymous session.
    pub async fn validate(&self, token: Option<&str>) -> Result<Session, AuthError> {
        if !self.enabled {
            return Ok(Session::anonymous());
        }

        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;
        let now = Utc::now();

        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSession)?;

        if session.is_expired(now) {
            self.sessions.write().await.remove(token);
            tracing::debug!(email = %session.email, "Session expired");
            return Err(AuthError::InvalidSession);
        }

        Ok(session)
    }

    pub async fn active_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_expired(now))
            .count()
    }

    #[cfg(test)]
    pub(crate) async fn expire_all(&self) {
        let past = Utc::now() - Duration::seconds(1);
        for session in self.sessions.write().await.values_mut() {
            session.expires_at = past;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> AuthConfig {
        AuthConfig {
            enabled,
            session_ttl_hours: 12,
            operators: vec![OperatorConfig {
                email: "gerente@loja.com".to_string(),
                access_key: "s3cret".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_login_and_validate() {
        let store = SessionStore::new(&config(true));

        let session = store.login(" Gerente@Loja.com ", "s3cret").await.unwrap();
        assert_eq!(session.email, "gerente@loja.com");
        assert_eq!(store.active_count().await, 1);

        let found = store.validate(Some(&session.token)).await.unwrap();
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let store = SessionStore::new(&config(true));
        assert!(matches!(
            store.login("gerente@loja.com", "wrong").await,
            Err(AuthError::BadCredentials)
        ));
        assert!(matches!(
            store.login("outro@loja.com", "s3cret").await,
            Err(AuthError::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn test_missing_unknown_and_expired() {
        let store = SessionStore::new(&config(true));
        assert!(matches!(store.validate(None).await, Err(AuthError::MissingToken)));
        assert!(matches!(
            store.validate(Some("nope")).await,
            Err(AuthError::InvalidSession)
        ));

        let session = store.login("gerente@loja.com", "s3cret").await.unwrap();
        store.expire_all().await;
        assert!(matches!(
            store.validate(Some(&session.token)).await,
            Err(AuthError::InvalidSession)
        ));
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_logout() {
        let store = SessionStore::new(&config(true));
        let session = store.login("gerente@loja.com", "s3cret").await.unwrap();

        assert!(store.logout(&session.token).await);
        assert!(!store.logout(&session.token).await);
        assert!(store.validate(Some(&session.token)).await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_guard_is_anonymous() {
        let store = SessionStore::new(&config(false));
        let session = store.validate(None).await.unwrap();
        assert_eq!(session.email, ANONYMOUS);
    }
}
