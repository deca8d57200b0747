//! Third-party OAuth provider checks
//!
//! A login presents an access token issued by Google or Facebook. The
//! token is checked once against the provider's token/profile endpoint
//! with a fixed timeout and no retry; any failure means "not verified".

use std::time::Duration;

use axum::async_trait;
use serde_json::Value;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::metrics::PROVIDER_CHECKS_TOTAL;

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    /// Parse a provider name as sent by clients
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" => Some(Provider::Google),
            "facebook" => Some(Provider::Facebook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }
}

/// Checks provider access tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Profile returned by the provider, `None` if the token is not accepted
    async fn verify_access_token(&self, provider: Provider, access_token: &str) -> Option<Value>;
}

/// Local username for a provider profile
///
/// The local part of `email` is preferred; `id` and `user_id` are the
/// fallbacks.
pub fn username_from_profile(profile: &Value) -> Option<String> {
    let from_email = profile
        .get("email")
        .and_then(Value::as_str)
        .and_then(|email| email.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty());
    if let Some(local) = from_email {
        return Some(local.to_string());
    }

    ["id", "user_id"].iter().find_map(|key| match profile.get(*key)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

/// HTTP implementation of [`TokenVerifier`]
pub struct ProviderVerifier {
    client: reqwest::Client,
    google_tokeninfo_url: String,
    facebook_graph_url: String,
}

impl ProviderVerifier {
    /// Build a verifier from auth configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Socialize/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            google_tokeninfo_url: config.google_tokeninfo_url.clone(),
            facebook_graph_url: config.facebook_graph_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, provider: Provider, access_token: &str) -> reqwest::RequestBuilder {
        match provider {
            Provider::Google => self
                .client
                .get(&self.google_tokeninfo_url)
                .query(&[("access_token", access_token)]),
            Provider::Facebook => self
                .client
                .get(format!("{}/me", self.facebook_graph_url))
                .query(&[("access_token", access_token), ("fields", "email")]),
        }
    }
}

#[async_trait]
impl TokenVerifier for ProviderVerifier {
    async fn verify_access_token(&self, provider: Provider, access_token: &str) -> Option<Value> {
        let result = match self.request(provider, access_token).send().await {
            Ok(response) if response.status().is_success() => response.json::<Value>().await.ok(),
            Ok(response) => {
                tracing::info!(
                    provider = provider.as_str(),
                    status = %response.status(),
                    "Provider rejected access token"
                );
                None
            }
            Err(error) => {
                tracing::warn!(provider = provider.as_str(), %error, "Provider check failed");
                None
            }
        };

        PROVIDER_CHECKS_TOTAL
            .with_label_values(&[
                provider.as_str(),
                if result.is_some() { "accepted" } else { "rejected" },
            ])
            .inc();

        result
    }
}
