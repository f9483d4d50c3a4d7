//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from registration, login, or the credential gate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` credential on the request.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The credential failed verification, or is bound to no known user.
    /// Those two cases are indistinguishable on purpose.
    #[error("invalid credential")]
    InvalidCredential,

    /// The credential is past its expiry.
    #[error("credential expired")]
    Expired,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] orchard_core::EmailError),

    /// Password too weak.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Registration against an email that is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Login with a wrong email/password pair. Never says which half was
    /// wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Password hashing failure.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be issued.
    #[error("token issuance failed")]
    TokenIssuance,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
