//! ActivityPub endpoints
//!
//! - Actor profile and creation
//! - Inbox (activity receiving)
//! - Outbox
//! - Objects
//! - Vault check

use axum::body::Bytes;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{MethodRouter, delete, get, patch, post},
};
use serde_json::{Value, json};

use crate::AppState;
use crate::api::converters::{actor_to_response, object_to_response};
use crate::api::dto::*;
use crate::auth::{SignedActor, require_signature};
use crate::data::ActorUpdate;
use crate::error::AppError;
use crate::federation::{actor_document, object_document, ordered_collection};
use crate::service::VaultCheck;

/// Register `path` with and without a trailing slash
fn route_both(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::Validation("Invalid JSON data".to_string()))
}

/// Create ActivityPub router
///
/// Routes:
/// - GET /users/:username - Actor profile
/// - POST /users - Create actor (unsigned)
/// - PATCH /users/:username - Update profile (signed)
/// - GET /actors/:id - Actor by id
/// - GET /users/:username/outbox - Outbox
/// - POST /users/:username/inbox - Inbox (signed)
/// - POST /users/:username/objects - Create object (signed)
/// - GET /objects/:id - Object
/// - PATCH /objects/:id - Update object (signed)
/// - DELETE /objects/:id - Delete object (signed)
/// - GET /users/:username/vault - Vault check
///
/// Every path also accepts a trailing slash.
pub fn activitypub_router(state: AppState) -> Router<AppState> {
    let mut public = Router::new();
    public = route_both(public, "/users", post(create_actor));
    public = route_both(public, "/users/:username", get(actor));
    public = route_both(public, "/actors/:id", get(actor_by_id));
    public = route_both(public, "/users/:username/outbox", get(outbox));
    public = route_both(public, "/users/:username/vault", get(vault));
    public = route_both(public, "/objects/:id", get(object));

    let mut signed = Router::new();
    signed = route_both(signed, "/users/:username", patch(update_actor));
    signed = route_both(signed, "/users/:username/inbox", post(inbox));
    signed = route_both(signed, "/users/:username/objects", post(create_object));
    signed = route_both(
        signed,
        "/objects/:id",
        patch(update_object).merge(delete(delete_object)),
    );
    let signed = signed.route_layer(middleware::from_fn_with_state(state, require_signature));

    public.merge(signed)
}

/// GET /users/:username
///
/// Returns the ActivityPub Actor document, or the plain representation
/// with `?activitypub=false`.
async fn actor(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<RepresentationQuery>,
) -> Result<Response, AppError> {
    let actor = state.actors.get_by_username(&username).await?;

    if query.wants_activitypub() {
        Ok(Json(actor_document(&actor)).into_response())
    } else {
        Ok(Json(actor_to_response(&actor)).into_response())
    }
}

/// GET /actors/:id
///
/// Target of the WebFinger `self` link.
async fn actor_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let actor = state.actors.get_by_id(&id).await?;
    Ok(Json(actor_document(&actor)))
}

/// POST /users
///
/// Creates an actor with a fresh key pair and vault.
///
/// Body: `{"username": "..."}`
async fn create_actor(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedActorResponse>), AppError> {
    let request: CreateActorRequest = parse_body(&body)?;
    let username = request
        .username
        .ok_or_else(|| AppError::Validation("username is required".to_string()))?;

    let actor = state.actors.create_actor(&username).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedActorResponse {
            id: actor.actor_url(),
        }),
    ))
}

/// PATCH /users/:username
///
/// Only `display_name`, `bio`, `title` and `actor_type` may change.
async fn update_actor(
    State(state): State<AppState>,
    Path(username): Path<String>,
    signer: SignedActor,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    signer.ensure_is(&username)?;
    let update: ActorUpdate = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid profile update: {}", e)))?;

    let actor = state.actors.update_profile(&username, &update).await?;
    Ok(Json(actor_document(&actor)))
}

/// GET /users/:username/outbox
///
/// Returns an OrderedCollection of the actor's activities, newest first.
async fn outbox(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (actor, activities) = state.activities.outbox(&username).await?;
    Ok(Json(ordered_collection(actor.outbox.as_deref(), &activities)))
}

/// POST /users/:username/inbox
///
/// Stores any JSON activity addressed to the actor.
async fn inbox(
    State(state): State<AppState>,
    Path(username): Path<String>,
    SignedActor(signer): SignedActor,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    tracing::debug!(%username, %signer, "Inbox delivery");
    state.activities.receive(&username, &body).await?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

/// POST /users/:username/objects
///
/// Body: `{"type": "Note", "content": "..."}`
async fn create_object(
    State(state): State<AppState>,
    Path(username): Path<String>,
    signer: SignedActor,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    signer.ensure_is(&username)?;
    let request: CreateObjectRequest = parse_body(&body)?;
    let content = request
        .content
        .ok_or_else(|| AppError::Validation("content is required".to_string()))?;

    let object = state
        .objects
        .create(&username, request.object_type.as_deref(), &content)
        .await?;

    Ok((StatusCode::CREATED, Json(object_document(&object))))
}

/// GET /objects/:id
async fn object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RepresentationQuery>,
) -> Result<Response, AppError> {
    let (object, owner) = state.objects.get(&id).await?;

    if query.wants_activitypub() {
        Ok(Json(object_document(&object)).into_response())
    } else {
        Ok(Json(object_to_response(&object, &owner)).into_response())
    }
}

/// PATCH /objects/:id
///
/// Body: `{"type": "...", "content": "..."}`, both optional
async fn update_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    SignedActor(signer): SignedActor,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: UpdateObjectRequest = parse_body(&body)?;
    let object = state
        .objects
        .update(
            &signer,
            &id,
            request.object_type.as_deref(),
            request.content.as_deref(),
        )
        .await?;

    Ok(Json(object_document(&object)))
}

/// DELETE /objects/:id
async fn delete_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    SignedActor(signer): SignedActor,
) -> Result<StatusCode, AppError> {
    state.objects.delete(&signer, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:username/vault
///
/// 200 when the vault holds the private half of the actor's published
/// key, 404 otherwise.
async fn vault(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (status, body) = match state.actors.check_vault(&username).await? {
        VaultCheck::Ready => (
            StatusCode::OK,
            json!({ "message": "Vault already has the private key" }),
        ),
        VaultCheck::UnknownActor => (StatusCode::NOT_FOUND, json!({ "error": "User not found" })),
        VaultCheck::MissingVault => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Private key not found in vault" }),
        ),
        VaultCheck::KeyMismatch => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Private key does not match public key" }),
        ),
    };

    Ok((status, Json(body)))
}
