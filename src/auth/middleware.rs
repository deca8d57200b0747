//! Payload signing middleware
//!
//! Mutating requests must carry `Username` and `Signature` headers; the
//! signature covers the raw request body and is checked against the
//! named actor's public key. Responses to those requests are signed in
//! turn with the same actor's private key.

use axum::{
    async_trait,
    body::{Body, to_bytes},
    extract::{FromRequestParts, State},
    http::{HeaderMap, HeaderValue, Method, Request, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;
use crate::metrics::RESPONSES_SIGNED_TOTAL;

/// Header naming the signing actor
pub const USERNAME_HEADER: &str = "username";
/// Header carrying the base64 body signature
pub const SIGNATURE_HEADER: &str = "signature";

/// Whether requests with this method must be signed
///
/// DELETE is signed as well as POST, PUT and PATCH: object deletes are
/// owner-scoped and need a verified signer.
pub fn requires_signature(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn signature_headers(headers: &HeaderMap) -> Option<(HeaderValue, String, String)> {
    let username_value = headers.get(USERNAME_HEADER)?.clone();
    let username = username_value.to_str().ok()?.trim().to_string();
    let signature = headers.get(SIGNATURE_HEADER)?.to_str().ok()?.trim().to_string();
    if username.is_empty() || signature.is_empty() {
        return None;
    }
    Some((username_value, username, signature))
}

/// Middleware verifying request signatures and signing responses
///
/// Requests with safe methods pass through untouched.
///
/// # Usage
/// ```ignore
/// let signed_routes = Router::new()
///     .route("/users/:username/inbox", post(...))
///     .route_layer(middleware::from_fn_with_state(state, require_signature));
/// ```
pub async fn require_signature(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !requires_signature(request.method()) {
        return Ok(next.run(request).await);
    }

    let limit = state.config.server.max_body_bytes;
    let (mut parts, body) = request.into_parts();

    let Some((username_value, username, signature)) = signature_headers(&parts.headers) else {
        tracing::info!(method = %parts.method, path = %parts.uri.path(), "Unsigned request rejected");
        return Err(AppError::InvalidSignature);
    };

    let body = to_bytes(body, limit)
        .await
        .map_err(|_| AppError::Validation("Request body too large".to_string()))?;

    if !state.signer.verify(&username, &signature, &body).await {
        return Err(AppError::InvalidSignature);
    }

    parts.extensions.insert(SignedActor(username.clone()));
    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    if !state.config.federation.sign_responses {
        return Ok(response);
    }

    Ok(sign_response(&state, &username, username_value, response).await)
}

/// Attach `Signature`/`Username` headers to a handler's response
///
/// The handler has already committed its work, so the response is never
/// replaced: anything that prevents signing leaves it unsigned.
async fn sign_response(
    state: &AppState,
    username: &str,
    username_value: HeaderValue,
    response: Response,
) -> Response {
    let (mut parts, body) = response.into_parts();

    // Handler bodies are already in memory; the request cap does not apply.
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(%username, %error, "Response body could not be buffered for signing");
            RESPONSES_SIGNED_TOTAL.with_label_values(&["unsigned"]).inc();
            return Response::from_parts(parts, Body::empty());
        }
    };

    let signed = match state.signer.sign(username, &body).await {
        Ok(signature) => HeaderValue::from_str(&signature)
            .map_err(|error| AppError::Internal(error.into())),
        Err(error) => Err(error),
    };

    match signed {
        Ok(value) => {
            parts.headers.insert(SIGNATURE_HEADER, value);
            parts.headers.insert(USERNAME_HEADER, username_value);
            RESPONSES_SIGNED_TOTAL.with_label_values(&["signed"]).inc();
        }
        Err(error) => {
            tracing::warn!(%username, %error, "Response left unsigned");
            RESPONSES_SIGNED_TOTAL.with_label_values(&["unsigned"]).inc();
        }
    }

    Response::from_parts(parts, Body::from(body))
}

/// Extractor for the actor whose signature was verified
///
/// Only available on routes behind [`require_signature`].
///
/// # Usage
/// ```ignore
/// async fn handler(SignedActor(username): SignedActor) -> impl IntoResponse {
///     format!("Signed by {}", username)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedActor(pub String);

impl SignedActor {
    /// Fail with `Forbidden` unless the signer is `username`
    pub fn ensure_is(&self, username: &str) -> Result<(), AppError> {
        if self.0 == username {
            Ok(())
        } else {
            tracing::warn!(signer = %self.0, target = %username, "Signer acting on another actor");
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SignedActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SignedActor>()
            .cloned()
            .ok_or(AppError::InvalidSignature)
    }
}
