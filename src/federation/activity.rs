//! ActivityStreams documents
//!
//! Builds the JSON-LD shapes served to peers for actors, objects,
//! activities and collections.

use serde_json::{Value, json};

use crate::data::{Activity, Actor, Object};

/// JSON-LD context for plain ActivityStreams documents
pub const ACTIVITYSTREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
/// JSON-LD context carrying `publicKey`
pub const SECURITY_CONTEXT: &str = "https://w3id.org/security/v1";

/// Activity type recorded for inbox payloads without a `type`
pub const FALLBACK_ACTIVITY_TYPE: &str = "Object";

/// Activity verbs the server itself emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Create,
    Update,
    Delete,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Create => "Create",
            ActivityKind::Update => "Update",
            ActivityKind::Delete => "Delete",
        }
    }
}

/// ActivityPub representation of an actor
pub fn actor_document(actor: &Actor) -> Value {
    let actor_url = actor.actor_url();
    json!({
        "@context": [ACTIVITYSTREAMS_CONTEXT, SECURITY_CONTEXT],
        "id": actor_url,
        "type": actor.actor_type,
        "name": actor.name(),
        "preferredUsername": actor.username,
        "summary": actor.bio,
        "inbox": actor.inbox,
        "outbox": actor.outbox,
        "publicKey": {
            "id": format!("{}#main-key", actor_url),
            "owner": actor_url,
            "publicKeyPem": actor.public_key,
        },
    })
}

/// ActivityPub representation of an object
pub fn object_document(object: &Object) -> Value {
    json!({
        "@context": ACTIVITYSTREAMS_CONTEXT,
        "id": object.object_url(),
        "type": object.object_type,
        "content": object.content,
        "actor": format!("/actors/{}", object.actor_id),
        "published": object.published_at.to_rfc3339(),
        "updated": object.updated_at.to_rfc3339(),
    })
}

/// Wrap an object in an activity authored by `actor`
///
/// Deletes carry a `Tombstone` instead of the full object.
pub fn object_activity(kind: ActivityKind, actor: &Actor, object: &Object) -> Activity {
    let object_value = match kind {
        ActivityKind::Delete => json!({
            "id": object.object_url(),
            "type": "Tombstone",
        }),
        _ => {
            let mut document = object_document(object);
            if let Some(map) = document.as_object_mut() {
                map.remove("@context");
            }
            document
        }
    };

    let mut activity = Activity::new(&actor.id, kind.as_str(), &Value::Null);
    let payload = json!({
        "@context": ACTIVITYSTREAMS_CONTEXT,
        "id": format!("/activities/{}", activity.id),
        "type": kind.as_str(),
        "actor": actor.actor_url(),
        "object": object_value,
        "published": activity.published_at.to_rfc3339(),
    });
    activity.object_data = payload.to_string();
    activity
}

/// Activity type named by an inbound payload
pub fn activity_type_of(payload: &Value) -> &str {
    payload
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .unwrap_or(FALLBACK_ACTIVITY_TYPE)
}

/// Outbox collection, items in the order given
pub fn ordered_collection(id: Option<&str>, activities: &[Activity]) -> Value {
    let items: Vec<Value> = activities.iter().map(Activity::payload).collect();
    json!({
        "@context": ACTIVITYSTREAMS_CONTEXT,
        "id": id,
        "type": "OrderedCollection",
        "totalItems": items.len(),
        "orderedItems": items,
    })
}
