//! Well-known endpoints
//!
//! - /.well-known/webfinger

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::federation::{WebFingerResponse, generate_webfinger_response, parse_acct_resource};

/// Create well-known router
///
/// Routes:
/// - GET /.well-known/webfinger
pub fn wellknown_router() -> Router<AppState> {
    Router::new()
        .route("/.well-known/webfinger", get(webfinger))
        .route("/.well-known/webfinger/", get(webfinger))
}

/// WebFinger query parameters
#[derive(Debug, Deserialize)]
struct WebFingerQuery {
    resource: Option<String>,
}

/// GET /.well-known/webfinger
///
/// Responds to WebFinger queries for local actors.
///
/// Query: ?resource=acct:user@domain
///
/// The domain part of the resource is not compared with the local
/// domain; the subject always names the configured domain.
async fn webfinger(
    State(state): State<AppState>,
    Query(query): Query<WebFingerQuery>,
) -> Result<Json<WebFingerResponse>, AppError> {
    let resource = query
        .resource
        .ok_or_else(|| AppError::Validation("Invalid WebFinger request".to_string()))?;
    let acct = parse_acct_resource(&resource)?;

    let actor = state.actors.get_by_username(&acct.username).await?;
    Ok(Json(generate_webfinger_response(
        &actor,
        &state.config.server.domain,
    )))
}
