//! Socialize binary entry point

use socialize::{AppState, config};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber
///
/// Logging is set up before configuration is loaded, so the format and
/// level come straight from `SOCIALIZE__LOGGING__*`. `RUST_LOG` wins
/// over both when set.
fn init_tracing() {
    let format =
        std::env::var("SOCIALIZE__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let level = std::env::var("SOCIALIZE__LOGGING__LEVEL").unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("socialize={},tower_http=debug", level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!("Starting Socialize...");

    socialize::metrics::init_metrics();

    let config = config::AppConfig::load()?;
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        sign_responses = config.federation.sign_responses,
        "Configuration loaded"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let public_url = config.server.base_url();

    let state = AppState::new(config).await?;
    let app = socialize::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %public_url, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
