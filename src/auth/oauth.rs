//! Provider login flow
//!
//! Exchanges a Google or Facebook access token for a local bearer
//! token, and refreshes local tokens.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    response::Json,
    routing::post,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::service::IssuedToken;

/// Create authentication router
///
/// Routes:
/// - POST /auth - Log in with a provider access token
/// - POST /auth/refresh - Refresh a local bearer token
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/refresh/", post(refresh))
}

/// Login request body
#[derive(Debug, Deserialize)]
struct LoginRequest {
    provider: String,
    access_token: String,
}

/// POST /auth
///
/// Body: `{"provider": "google" | "facebook", "access_token": "..."}`
async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IssuedToken>, AppError> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("Invalid JSON data".to_string()))?;

    let issued = state
        .auth
        .login(&request.provider, &request.access_token)
        .await?;
    Ok(Json(issued))
}

/// POST /auth/refresh
///
/// Header: `Authorization: Bearer <token>`
async fn refresh(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<IssuedToken>, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;
    let issued = state.auth.refresh(bearer.token()).await?;
    Ok(Json(issued))
}
