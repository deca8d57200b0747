//! Actor service
//!
//! Handles actor creation (with key pair and vault), lookup, profile
//! updates and vault checks.

use std::sync::Arc;

use crate::data::{
    Actor, ActorUpdate, BIO_MAX_CHARS, Database, EntityId, TITLE_MAX_CHARS, Vault,
};
use crate::error::AppError;
use crate::federation::{generate_keys_blocking, key_pair_matches};
use crate::metrics::ACTORS_CREATED_TOTAL;

/// Maximum username length
pub const USERNAME_MAX_CHARS: usize = 150;

/// Actor types a profile may switch to
pub const ACTOR_TYPES: [&str; 5] = ["Person", "Group", "Organization", "Service", "Application"];

/// Outcome of a vault check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultCheck {
    /// Vault present and holding the private half of the published key
    Ready,
    UnknownActor,
    MissingVault,
    KeyMismatch,
}

/// Check a username against the allowed alphabet
///
/// Letters, digits and `.`, `_`, `-`, `+` are accepted.
pub fn validate_username(username: &str) -> Result<&str, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "username must be at most {} characters",
            USERNAME_MAX_CHARS
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'))
    {
        return Err(AppError::Validation(
            "username may only contain letters, digits and . _ - +".to_string(),
        ));
    }
    Ok(username)
}

fn validate_update(update: &ActorUpdate) -> Result<(), AppError> {
    if let Some(bio) = &update.bio {
        if bio.chars().count() > BIO_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "bio must be at most {} characters",
                BIO_MAX_CHARS
            )));
        }
    }
    if let Some(title) = &update.title {
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {} characters",
                TITLE_MAX_CHARS
            )));
        }
    }
    if let Some(actor_type) = &update.actor_type {
        if !ACTOR_TYPES.contains(&actor_type.as_str()) {
            return Err(AppError::Validation(format!(
                "unsupported actor type: {}",
                actor_type
            )));
        }
    }
    Ok(())
}

/// Actor service
#[derive(Clone)]
pub struct ActorService {
    db: Arc<Database>,
    base_url: String,
}

impl ActorService {
    /// Create new actor service
    ///
    /// # Arguments
    /// * `base_url` - Public base URL inbox/outbox links are built from
    pub fn new(db: Arc<Database>, base_url: String) -> Self {
        Self { db, base_url }
    }

    /// Get an actor by username
    pub async fn get_by_username(&self, username: &str) -> Result<Actor, AppError> {
        self.db
            .get_actor_by_username(username)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Get an actor by id
    ///
    /// Ids that are not UUIDs are reported as not found.
    pub async fn get_by_id(&self, id: &str) -> Result<Actor, AppError> {
        let id = EntityId::parse(id).ok_or(AppError::NotFound)?;
        self.db.get_actor(&id.0).await?.ok_or(AppError::NotFound)
    }

    /// Create an actor with a fresh key pair and its vault
    ///
    /// Keys are generated first; the actor and vault rows are then
    /// written in a single transaction.
    ///
    /// # Errors
    /// - `Validation` for a blank or malformed username
    /// - `Conflict` when the username is taken
    pub async fn create_actor(&self, username: &str) -> Result<Actor, AppError> {
        let username = validate_username(username)?;

        // Fast-path guard before expensive key generation.
        if self.db.get_actor_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("username already taken".to_string()));
        }

        let keys = generate_keys_blocking().await?;
        let actor = Actor::new_local(username, keys.public_pem, &self.base_url);
        let vault = Vault::new(&actor.id, keys.private_pem);

        match self.db.create_actor_with_vault(&actor, &vault).await {
            Ok(()) => {}
            Err(error) if error.is_unique_violation() => {
                return Err(AppError::Conflict("username already taken".to_string()));
            }
            Err(error) => return Err(error),
        }

        ACTORS_CREATED_TOTAL.inc();
        tracing::info!(username = %actor.username, actor_id = %actor.id, "Actor created");

        Ok(actor)
    }

    /// Get an existing actor or create one
    ///
    /// Losing a creation race to a concurrent request yields the
    /// winner's actor.
    pub async fn find_or_create(&self, username: &str) -> Result<Actor, AppError> {
        let username = validate_username(username)?;
        if let Some(actor) = self.db.get_actor_by_username(username).await? {
            return Ok(actor);
        }

        match self.create_actor(username).await {
            Err(AppError::Conflict(_)) => self.get_by_username(username).await,
            other => other,
        }
    }

    /// Apply an allow-listed profile update
    pub async fn update_profile(
        &self,
        username: &str,
        update: &ActorUpdate,
    ) -> Result<Actor, AppError> {
        validate_update(update)?;

        let mut actor = self.get_by_username(username).await?;
        if update.is_empty() {
            return Ok(actor);
        }

        update.apply_to(&mut actor);
        actor.updated_at = chrono::Utc::now();

        if !self.db.update_actor_profile(&actor).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(username = %actor.username, "Actor profile updated");
        Ok(actor)
    }

    /// Check that an actor's vault exists and matches its public key
    pub async fn check_vault(&self, username: &str) -> Result<VaultCheck, AppError> {
        let Some(actor) = self.db.get_actor_by_username(username).await? else {
            return Ok(VaultCheck::UnknownActor);
        };
        let Some(vault) = self.db.get_vault_by_username(username).await? else {
            tracing::warn!(%username, "Actor has no vault");
            return Ok(VaultCheck::MissingVault);
        };

        if key_pair_matches(&vault.private_key, &actor.public_key) {
            Ok(VaultCheck::Ready)
        } else {
            tracing::error!(%username, "Vault key does not match published public key");
            Ok(VaultCheck::KeyMismatch)
        }
    }
}
