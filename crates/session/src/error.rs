use thiserror::Error;

use gestor_auth::{PasswordError, TokenError};
use gestor_store::StoreError;

/// Session lifecycle failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown email, wrong password, or deactivated account — deliberately
    /// one variant so responses cannot be used to probe which emails exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The presented refresh token is unknown or its subject is gone.
    #[error("invalid refresh token")]
    InvalidToken,

    /// The refresh token's validity window has passed.
    #[error("refresh token expired")]
    TokenExpired,

    /// An already-rotated refresh token was presented again. Every live
    /// session for the subject has been revoked before this is returned.
    #[error("refresh token reuse detected; all sessions revoked")]
    SuspiciousActivity,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
