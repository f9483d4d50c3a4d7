//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orchard_core::UserId;

use crate::error::Result;
use crate::services::auth::{AuthService, AuthenticatedUser};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful registration or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl From<AuthenticatedUser> for AuthResponse {
    fn from(authenticated: AuthenticatedUser) -> Self {
        Self {
            id: authenticated.user.id,
            name: authenticated.user.name,
            email: authenticated.user.email.to_string(),
            token: authenticated.token,
        }
    }
}

/// Create a new account and issue its first bearer token.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.users(), state.tokens());
    let authenticated = auth
        .register(&body.name, &body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(authenticated))))
}

/// Exchange email and password for a fresh bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.users(), state.tokens());
    let authenticated = auth.login(&body.email, &body.password).await?;

    Ok(Json(AuthResponse::from(authenticated)))
}
