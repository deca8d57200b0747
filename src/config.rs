//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub federation: FederationConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain, used as the WebFinger subject domain
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Upper bound for buffered request and response bodies
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://social.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Federation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// Attach a `Signature` header to responses of mutating requests
    pub sign_responses: bool,
}

/// Authentication configuration (third-party OAuth providers)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of issued access tokens in seconds (default: 3600)
    pub token_ttl_seconds: i64,
    /// Socket timeout for provider token checks (default: 10)
    pub provider_timeout_seconds: u64,
    /// Google tokeninfo endpoint
    pub google_tokeninfo_url: String,
    /// Facebook Graph API base URL (`/me` is appended)
    pub facebook_graph_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (SOCIALIZE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("server.max_body_bytes", 1_048_576)?
            .set_default("database.path", "data/socialize.db")?
            .set_default("federation.sign_responses", true)?
            .set_default("auth.token_ttl_seconds", 3600)?
            .set_default("auth.provider_timeout_seconds", 10)?
            .set_default(
                "auth.google_tokeninfo_url",
                "https://www.googleapis.com/oauth2/v1/tokeninfo",
            )?
            .set_default("auth.facebook_graph_url", "https://graph.facebook.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SOCIALIZE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        let protocol = self.server.protocol.to_ascii_lowercase();
        if protocol != "http" && protocol != "https" {
            return Err(AppError::Config(format!(
                "server.protocol must be http or https, got {}",
                self.server.protocol
            )));
        }

        if self.server.domain.trim().is_empty() {
            return Err(AppError::Config(
                "server.domain must not be empty".to_string(),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(AppError::Config(
                "server.max_body_bytes must be greater than 0".to_string(),
            ));
        }

        if self.auth.token_ttl_seconds <= 0 {
            return Err(AppError::Config(
                "auth.token_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if self.auth.provider_timeout_seconds == 0 {
            return Err(AppError::Config(
                "auth.provider_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("auth.google_tokeninfo_url", &self.auth.google_tokeninfo_url),
            ("auth.facebook_graph_url", &self.auth.facebook_graph_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        Ok(())
    }
}
