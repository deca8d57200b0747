//! Authentication service
//!
//! Exchanges a verified provider access token for a local bearer
//! token and refreshes local tokens.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use super::ActorService;
use crate::auth::{Provider, TokenVerifier, username_from_profile};
use crate::data::{Database, Token};
use crate::error::AppError;

/// Token handed to clients
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    actors: ActorService,
    verifier: Arc<dyn TokenVerifier>,
    token_ttl: Duration,
}

impl AuthService {
    /// Create new auth service
    ///
    /// # Arguments
    /// * `token_ttl_seconds` - Lifetime of issued and refreshed tokens
    pub fn new(
        db: Arc<Database>,
        actors: ActorService,
        verifier: Arc<dyn TokenVerifier>,
        token_ttl_seconds: i64,
    ) -> Self {
        Self {
            db,
            actors,
            verifier,
            token_ttl: Duration::seconds(token_ttl_seconds),
        }
    }

    fn issued(&self, token: &Token) -> IssuedToken {
        IssuedToken {
            access_token: token.access_token.clone(),
            expires_in: self.token_ttl.num_seconds(),
        }
    }

    /// Log in with a provider access token
    ///
    /// The actor is created on first login.
    ///
    /// # Errors
    /// - `Validation` for an unsupported provider
    /// - `Unauthorized` when the provider does not accept the token or
    ///   its profile names no usable identity
    pub async fn login(
        &self,
        provider_name: &str,
        access_token: &str,
    ) -> Result<IssuedToken, AppError> {
        let provider = Provider::from_name(provider_name).ok_or_else(|| {
            AppError::Validation(format!("unsupported provider: {}", provider_name))
        })?;
        if access_token.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }

        let profile = self
            .verifier
            .verify_access_token(provider, access_token)
            .await
            .ok_or(AppError::Unauthorized)?;
        let username = username_from_profile(&profile).ok_or_else(|| {
            tracing::warn!(provider = provider.as_str(), "Provider profile has no identity");
            AppError::Unauthorized
        })?;

        // Identities are keyed on the email local part, so the same
        // local part from any domain or provider maps to one actor.
        let actor = match self.actors.find_or_create(&username).await {
            Err(AppError::Validation(reason)) => {
                tracing::warn!(provider = provider.as_str(), %reason, "Provider identity is not a valid username");
                return Err(AppError::Unauthorized);
            }
            other => other?,
        };
        let token = Token::issue(&actor.id, self.token_ttl);
        self.db.insert_token(&token).await?;

        tracing::info!(
            username = %actor.username,
            provider = provider.as_str(),
            "Login succeeded"
        );
        Ok(self.issued(&token))
    }

    /// Replace a valid token with a fresh value and expiry
    ///
    /// # Errors
    /// `Unauthorized` for unknown, expired or concurrently refreshed tokens
    pub async fn refresh(&self, access_token: &str) -> Result<IssuedToken, AppError> {
        let mut token = self
            .db
            .get_token(access_token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !token.is_valid() {
            return Err(AppError::Unauthorized);
        }

        let previous = token.access_token.clone();
        token.refresh(self.token_ttl);
        let updated = self
            .db
            .update_token_value(&token.id, &previous, &token.access_token, token.expires_at)
            .await?;
        if !updated {
            return Err(AppError::Unauthorized);
        }

        tracing::debug!(actor_id = %token.actor_id, "Token refreshed");
        Ok(self.issued(&token))
    }
}
