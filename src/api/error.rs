//! API Error Types
//!
//! Maps errors from every layer to HTTP responses. The body always carries
//! a machine code, the technical message, and when relevant the notice to
//! show the operator and where to redirect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{AuthError, LOGIN_PAGE};
use crate::backoffice::PageError;
use crate::gallery::GalleryError;
use crate::notices;
use crate::records::StoreError;
use crate::storage::StorageError;
use crate::sync::SyncError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request rejected before anything was written
    #[error("Validation error: {message}")]
    Validation { message: String, notice: String },

    #[error("Not found: {message}")]
    NotFound { message: String, notice: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Record store error: {source}")]
    Store {
        notice: String,
        #[source]
        source: StoreError,
    },

    #[error("Object storage error: {source}")]
    Storage {
        notice: String,
        #[source]
        source: StorageError,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Validation failure whose message is also the notice
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            notice: message.clone(),
            message,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(AuthError::BadCredentials) => {
                (StatusCode::UNAUTHORIZED, "BAD_CREDENTIALS")
            }
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "SESSION_REQUIRED"),
            ApiError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    fn notice(&self) -> Option<String> {
        match self {
            ApiError::Validation { notice, .. }
            | ApiError::NotFound { notice, .. }
            | ApiError::Store { notice, .. }
            | ApiError::Storage { notice, .. } => Some(notice.clone()),
            ApiError::Unauthorized(AuthError::BadCredentials) => {
                Some(notices::LOGIN_FAILED.to_string())
            }
            ApiError::Unauthorized(_) => Some(notices::SESSION_REQUIRED.to_string()),
            ApiError::Internal(_) | ApiError::Io(_) => Some(notices::INTERNAL_ERROR.to_string()),
        }
    }

    fn redirect(&self) -> Option<&'static str> {
        match self {
            ApiError::Unauthorized(AuthError::MissingToken | AuthError::InvalidSession) => {
                Some(LOGIN_PAGE)
            }
            _ => None,
        }
    }
}

impl From<PageError> for ApiError {
    fn from(e: PageError) -> Self {
        let notice = e.notice();
        match e {
            PageError::Invalid(_) => ApiError::Validation {
                message: e.to_string(),
                notice,
            },
            PageError::NotFound { .. } => ApiError::NotFound {
                message: e.to_string(),
                notice,
            },
            PageError::Store { source, .. } => ApiError::Store { notice, source },
        }
    }
}

impl From<GalleryError> for ApiError {
    fn from(e: GalleryError) -> Self {
        let notice = e.notice();
        match e {
            GalleryError::TooManyPhotos { .. } | GalleryError::NoSuchPhoto { .. } => {
                ApiError::Validation {
                    message: e.to_string(),
                    notice,
                }
            }
            GalleryError::Upload(source) | GalleryError::Remove(source) => {
                ApiError::Storage { notice, source }
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(source: StoreError) -> Self {
        ApiError::Store {
            notice: notices::INTERNAL_ERROR.to_string(),
            source,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(source: StorageError) -> Self {
        ApiError::Storage {
            notice: notices::INTERNAL_ERROR.to_string(),
            source,
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
                notice: self.notice(),
                redirect: self.redirect(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoffice::FormError;

    #[test]
    fn test_page_errors_map_to_status() {
        let invalid = ApiError::from(PageError::Invalid(FormError::PriceNotPositive));
        assert_eq!(invalid.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.notice().as_deref(), Some("Preço deve ser positivo"));

        let missing = ApiError::from(PageError::NotFound {
            table: "carros",
            id: 1,
        });
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let err = ApiError::from(AuthError::InvalidSession);
        assert_eq!(err.status_and_code(), (StatusCode::UNAUTHORIZED, "SESSION_REQUIRED"));
        assert_eq!(err.redirect(), Some("/auth"));

        let bad_login = ApiError::from(AuthError::BadCredentials);
        assert_eq!(bad_login.redirect(), None);
        assert_eq!(bad_login.notice().as_deref(), Some(notices::LOGIN_FAILED));
    }

    #[test]
    fn test_gallery_errors() {
        let too_many = ApiError::from(GalleryError::TooManyPhotos {
            max: 10,
            existing: 10,
            incoming: 1,
        });
        assert_eq!(too_many.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(too_many.notice().as_deref(), Some("Máximo de 10 fotos permitidas"));

        let upload = ApiError::from(GalleryError::Upload(StorageError::Backend("x".into())));
        assert_eq!(upload.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upload.notice().as_deref(), Some(notices::UPLOAD_FAILED));
    }
}
