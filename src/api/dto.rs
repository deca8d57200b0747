//! Request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// POST /users
///
/// Unknown fields are ignored; profile fields are set afterwards with
/// PATCH.
#[derive(Debug, Deserialize)]
pub struct CreateActorRequest {
    pub username: Option<String>,
}

/// POST /users/:username/objects
#[derive(Debug, Deserialize)]
pub struct CreateObjectRequest {
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub content: Option<String>,
}

/// PATCH /objects/:id
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateObjectRequest {
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub content: Option<String>,
}

/// `?activitypub=false` switch for GET endpoints
#[derive(Debug, Deserialize)]
pub struct RepresentationQuery {
    pub activitypub: Option<bool>,
}

impl RepresentationQuery {
    /// ActivityPub is the default representation
    pub fn wants_activitypub(&self) -> bool {
        self.activitypub.unwrap_or(true)
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Plain (non-ActivityPub) actor representation
#[derive(Debug, Clone, Serialize)]
pub struct ActorResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub actor_type: String,
    pub bio: String,
    pub title: String,
    pub inbox: Option<String>,
    pub outbox: Option<String>,
    pub score: i64,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plain (non-ActivityPub) object representation
#[derive(Debug, Clone, Serialize)]
pub struct ObjectResponse {
    pub id: String,
    /// Owner username
    pub actor: String,
    pub object_type: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response to actor creation
#[derive(Debug, Clone, Serialize)]
pub struct CreatedActorResponse {
    /// Actor URL
    pub id: String,
}
