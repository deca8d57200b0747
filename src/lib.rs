//! Socialize - ActivityPub actors with signed inbox/outbox
//!
//! # Request flow
//!
//! ```text
//! HTTP ──► metrics / body limit / trace / CORS
//!            │
//!            ├─► /health, /metrics, /.well-known/webfinger
//!            ├─► /auth, /auth/refresh           (provider login, tokens)
//!            ├─► GET /users, /actors, /objects  (public documents)
//!            └─► POST/PATCH/DELETE              (require_signature)
//!                   │  verify body against the actor's public key
//!                   ▼
//!                 services ──► SQLite (actors, vaults, activities,
//!                   │                  objects, tokens)
//!                   ▼
//!                 response signed with the same actor's vault key
//! ```
//!
//! # Modules
//!
//! - `api`: ActivityPub, WebFinger and metrics handlers
//! - `auth`: Signing middleware and OAuth provider login
//! - `service`: Actor, activity, object and token operations
//! - `federation`: Keys, payload signatures, ActivityStreams documents
//! - `data`: SQLite models and queries
//! - `config`: Layered settings
//! - `error`: `AppError` and its HTTP mapping

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod federation;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Shared handler state
///
/// Cheap to clone: everything behind it is an `Arc` or a service
/// holding one.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Payload signer backed by actor vaults
    pub signer: federation::PayloadSigner,

    pub actors: service::ActorService,
    pub activities: service::ActivityService,
    pub objects: service::ObjectService,
    pub auth: service::AuthService,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build the provider HTTP client
    /// 3. Wire services
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!("Database connected");

        let verifier: Arc<dyn auth::TokenVerifier> =
            Arc::new(auth::ProviderVerifier::new(&config.auth)?);

        let state = Self::with_verifier(config, db, verifier);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Assemble state around an existing database and token verifier
    pub fn with_verifier(
        config: config::AppConfig,
        db: Arc<data::Database>,
        verifier: Arc<dyn auth::TokenVerifier>,
    ) -> Self {
        let keys: Arc<dyn data::KeyRepository> = db.clone();
        let actors = service::ActorService::new(db.clone(), config.server.base_url());
        let auth = service::AuthService::new(
            db.clone(),
            actors.clone(),
            verifier,
            config.auth.token_ttl_seconds,
        );

        Self {
            signer: federation::PayloadSigner::new(keys),
            activities: service::ActivityService::new(db.clone()),
            objects: service::ObjectService::new(db.clone()),
            actors,
            auth,
            config: Arc::new(config),
            db,
        }
    }
}

/// Assemble every router and the outer layers.
///
/// The binary and the e2e tests both serve exactly this router.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::wellknown_router())
        .merge(api::activitypub_router(state.clone()))
        .layer(middleware::from_fn(api::track_metrics))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
