//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Conversion to a
//! response picks the status code and a stable machine-readable kind;
//! server-side failures are captured to Sentry before answering and never
//! leak internal detail to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog seeding failed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingCredential
                | AuthError::InvalidCredential
                | AuthError::Expired
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::PasswordHash | AuthError::TokenIssuance | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::NonPositiveQuantity | CartError::InsufficientStock => {
                    StatusCode::BAD_REQUEST
                }
                CartError::ProductNotFound
                | CartError::CartNotFound
                | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::InventoryUnavailable => StatusCode::BAD_GATEWAY,
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::Fetch(_) => StatusCode::BAD_GATEWAY,
                CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind for the response body.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingCredential => "missing_credential",
                AuthError::InvalidCredential => "invalid_credential",
                AuthError::Expired => "expired_credential",
                AuthError::InvalidEmail(_) => "invalid_email",
                AuthError::WeakPassword(_) => "weak_password",
                AuthError::UserAlreadyExists => "user_already_exists",
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::PasswordHash | AuthError::TokenIssuance | AuthError::Repository(_) => {
                    "internal"
                }
            },
            Self::Cart(err) => match err {
                CartError::NonPositiveQuantity => "non_positive_quantity",
                CartError::ProductNotFound => "product_not_found",
                CartError::CartNotFound => "cart_not_found",
                CartError::ItemNotFound => "item_not_found",
                CartError::InsufficientStock => "insufficient_stock",
                CartError::InventoryUnavailable => "inventory_unavailable",
                CartError::Store(_) => "internal",
            },
            Self::Catalog(err) => match err {
                CatalogError::Fetch(_) => "seed_source_unavailable",
                CatalogError::Store(_) => "internal",
            },
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }

    /// Client-safe message. Internal details never leak.
    fn public_message(&self) -> String {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return "internal server error".to_owned();
        }
        if status == StatusCode::BAD_GATEWAY {
            return "upstream lookup failed".to_owned();
        }

        match self {
            Self::Auth(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.kind(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Auth(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Cart(CartError::NonPositiveQuantity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Cart(CartError::InsufficientStock).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Cart(CartError::ItemNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Cart(CartError::InventoryUnavailable).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(
            AppError::Cart(CartError::InsufficientStock).kind(),
            "insufficient_stock"
        );
        assert_eq!(
            AppError::Cart(CartError::ProductNotFound).kind(),
            "product_not_found"
        );
        assert_eq!(
            AppError::Auth(AuthError::MissingCredential).kind(),
            "missing_credential"
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).kind(),
            "invalid_credentials"
        );
    }

    #[test]
    fn test_internal_detail_never_leaks() {
        let err = AppError::Internal("connection string postgres://u:pw@host".to_string());
        assert_eq!(err.public_message(), "internal server error");

        let err = AppError::Database(RepositoryError::DataCorruption("row 17".to_string()));
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn test_auth_failures_share_one_message() {
        // Wrong password and unknown user must be indistinguishable.
        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(err.public_message(), "invalid email or password");
    }
}
