//! Data models
//!
//! Rust structs representing database entities.
//! All models use UUID strings for IDs and chrono for timestamps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (hyphenated UUID v4, 36 characters)
///
/// Example: "67e55044-10b1-426f-9247-bb680e5fe0c8"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new random UUID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parse an externally supplied id, normalizing it to the stored form.
    ///
    /// Returns `None` when the input is not a UUID.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Actor
// =============================================================================

/// A federated identity
///
/// The matching private key lives in exactly one [`Vault`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Absolute inbox URL
    pub inbox: Option<String>,
    /// Absolute outbox URL
    pub outbox: Option<String>,
    /// ActivityStreams actor type (Person, Group, Service, ...)
    pub actor_type: String,
    /// RSA public key (SPKI PEM)
    pub public_key: String,
    pub bio: String,
    pub title: String,
    pub score: i64,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Default actor type for new actors
pub const DEFAULT_ACTOR_TYPE: &str = "Person";
/// Maximum bio length in characters
pub const BIO_MAX_CHARS: usize = 140;
/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 50;

impl Actor {
    /// Build a fresh local actor with inbox/outbox under `base_url`.
    pub fn new_local(username: &str, public_key: String, base_url: &str) -> Self {
        let now = Utc::now();
        let actor_base = format!("{}/users/{}", base_url.trim_end_matches('/'), username);
        Self {
            id: EntityId::new().0,
            username: username.to_string(),
            display_name: None,
            inbox: Some(format!("{}/inbox/", actor_base)),
            outbox: Some(format!("{}/outbox/", actor_base)),
            actor_type: DEFAULT_ACTOR_TYPE.to_string(),
            public_key,
            bio: String::new(),
            title: String::new(),
            score: 0,
            joined_at: now,
            updated_at: now,
        }
    }

    /// Canonical actor path, also used as the WebFinger `self` link.
    pub fn actor_url(&self) -> String {
        format!("/actors/{}", self.id)
    }

    /// Display name, falling back to the username when unset or blank.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Allow-listed profile changes
///
/// Only these fields may be changed after creation; everything else
/// (keys, score, inbox/outbox, ids) is owned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub title: Option<String>,
    pub actor_type: Option<String>,
}

impl ActorUpdate {
    /// Whether the update carries no changes at all
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply onto an actor in memory
    pub fn apply_to(&self, actor: &mut Actor) {
        if let Some(display_name) = &self.display_name {
            actor.display_name = Some(display_name.clone());
        }
        if let Some(bio) = &self.bio {
            actor.bio = bio.clone();
        }
        if let Some(title) = &self.title {
            actor.title = title.clone();
        }
        if let Some(actor_type) = &self.actor_type {
            actor.actor_type = actor_type.clone();
        }
    }
}

// =============================================================================
// Vault
// =============================================================================

/// Private key storage for one actor
///
/// Deliberately not `Serialize`: a vault never leaves the server.
#[derive(Clone, sqlx::FromRow)]
pub struct Vault {
    pub id: String,
    pub actor_id: String,
    /// RSA private key (PKCS#1 PEM)
    pub private_key: String,
    pub created_at: DateTime<Utc>,
}

impl Vault {
    pub fn new(actor_id: &str, private_key: String) -> Self {
        Self {
            id: EntityId::new().0,
            actor_id: actor_id.to_string(),
            private_key,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id)
            .field("actor_id", &self.actor_id)
            .field("private_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

// =============================================================================
// Activity
// =============================================================================

/// An ActivityPub verb applied by (or delivered to) an actor
///
/// Append-only: rows are never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: String,
    pub actor_id: String,
    /// Create, Update, Delete, Follow, Like, Block, Undo, ...
    pub activity_type: String,
    /// Raw activity JSON
    pub object_data: String,
    pub published_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(actor_id: &str, activity_type: &str, payload: &serde_json::Value) -> Self {
        Self {
            id: EntityId::new().0,
            actor_id: actor_id.to_string(),
            activity_type: activity_type.to_string(),
            object_data: payload.to_string(),
            published_at: Utc::now(),
        }
    }

    /// Stored payload as JSON, `Null` if the row holds invalid JSON
    pub fn payload(&self) -> serde_json::Value {
        serde_json::from_str(&self.object_data).unwrap_or(serde_json::Value::Null)
    }
}

// =============================================================================
// Object
// =============================================================================

/// Default object type
pub const DEFAULT_OBJECT_TYPE: &str = "Note";

/// A content item owned by an actor (Note, Image, ...)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Object {
    pub id: String,
    pub actor_id: String,
    pub object_type: String,
    /// Sanitized HTML content
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Object {
    pub fn new(actor_id: &str, object_type: &str, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            actor_id: actor_id.to_string(),
            object_type: object_type.to_string(),
            content,
            published_at: now,
            updated_at: now,
        }
    }

    pub fn object_url(&self) -> String {
        format!("/objects/{}", self.id)
    }
}

// =============================================================================
// Token
// =============================================================================

/// Bearer token issued after a successful provider login
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: String,
    pub actor_id: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn issue(actor_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            actor_id: actor_id.to_string(),
            access_token: uuid::Uuid::new_v4().to_string(),
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Check whether the token is still usable
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }

    /// Regenerate the token value and push expiry `ttl` into the future.
    ///
    /// Persisting the change is the caller's job.
    pub fn refresh(&mut self, ttl: Duration) -> &str {
        self.access_token = uuid::Uuid::new_v4().to_string();
        self.expires_at = Utc::now() + ttl;
        &self.access_token
    }
}
