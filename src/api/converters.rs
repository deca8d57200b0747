//! Conversion functions from database models to API DTOs

use crate::api::dto::*;
use crate::data::{Actor, Object};

/// Convert Actor to ActorResponse
pub fn actor_to_response(actor: &Actor) -> ActorResponse {
    ActorResponse {
        id: actor.id.clone(),
        username: actor.username.clone(),
        display_name: actor.name().to_string(),
        actor_type: actor.actor_type.clone(),
        bio: actor.bio.clone(),
        title: actor.title.clone(),
        inbox: actor.inbox.clone(),
        outbox: actor.outbox.clone(),
        score: actor.score,
        joined_at: actor.joined_at,
        updated_at: actor.updated_at,
    }
}

/// Convert Object to ObjectResponse
///
/// # Arguments
/// * `owner` - The actor owning the object
pub fn object_to_response(object: &Object, owner: &Actor) -> ObjectResponse {
    ObjectResponse {
        id: object.id.clone(),
        actor: owner.username.clone(),
        object_type: object.object_type.clone(),
        content: object.content.clone(),
        published_at: object.published_at,
        updated_at: object.updated_at,
    }
}
