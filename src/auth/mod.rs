//! Session guard
//!
//! Operators log in with a configured email and access key and receive an
//! opaque bearer token. Every back-office route extracts
//! [`RequireSession`]; a missing or expired session is rejected with 401
//! and a redirect to the login page.

mod guard;
mod session;

pub use guard::{bearer_token, RequireSession, LOGIN_PAGE};
pub use session::{Session, SessionStore, ANONYMOUS};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("No session token provided")]
    MissingToken,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Unknown operator or wrong access key")]
    BadCredentials,
}
