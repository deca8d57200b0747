//! Key lookup seam used by the signer
//!
//! Signing and verification only ever need two lookups: the private
//! key held in an actor's vault and the public key published on the
//! actor. Keeping them behind a trait lets the signer run against the
//! database in production and against mocks in unit tests.

use axum::async_trait;

use super::Database;
use crate::error::AppError;

/// Source of actor key material, keyed by username
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// PEM private key from the actor's vault, `None` if there is no vault
    async fn private_key_pem(&self, username: &str) -> Result<Option<String>, AppError>;

    /// PEM public key published on the actor, `None` if there is no actor
    async fn public_key_pem(&self, username: &str) -> Result<Option<String>, AppError>;
}

#[async_trait]
impl KeyRepository for Database {
    async fn private_key_pem(&self, username: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .get_vault_by_username(username)
            .await?
            .map(|vault| vault.private_key))
    }

    async fn public_key_pem(&self, username: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .get_actor_by_username(username)
            .await?
            .map(|actor| actor.public_key))
    }
}
