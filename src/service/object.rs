//! Object service
//!
//! Creates, reads, updates and deletes objects. Every mutation is
//! recorded as a Create, Update or Delete activity in the owner's
//! outbox, in the same transaction as the object write.

use std::sync::Arc;

use crate::data::{Actor, DEFAULT_OBJECT_TYPE, Database, EntityId, Object};
use crate::error::AppError;
use crate::federation::{ActivityKind, object_activity};

/// Maximum length of an object type name
const OBJECT_TYPE_MAX_CHARS: usize = 64;

/// Sanitize object HTML, keeping only safe tags and attributes.
pub fn sanitize_content(content: &str) -> String {
    ammonia::clean(content)
}

fn normalize_object_type(object_type: Option<&str>) -> Result<String, AppError> {
    let object_type = object_type.map(str::trim).unwrap_or(DEFAULT_OBJECT_TYPE);
    if object_type.is_empty() {
        return Ok(DEFAULT_OBJECT_TYPE.to_string());
    }
    if object_type.len() > OBJECT_TYPE_MAX_CHARS
        || !object_type.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::Validation(format!(
            "invalid object type: {}",
            object_type
        )));
    }
    Ok(object_type.to_string())
}

/// Object service
#[derive(Clone)]
pub struct ObjectService {
    db: Arc<Database>,
}

impl ObjectService {
    /// Create new object service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn actor(&self, username: &str) -> Result<Actor, AppError> {
        self.db
            .get_actor_by_username(username)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Load an object together with its owner
    ///
    /// Ids that are not UUIDs are reported as not found.
    pub async fn get(&self, id: &str) -> Result<(Object, Actor), AppError> {
        let id = EntityId::parse(id).ok_or(AppError::NotFound)?;
        let object = self.db.get_object(&id.0).await?.ok_or(AppError::NotFound)?;
        let owner = self
            .db
            .get_actor(&object.actor_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok((object, owner))
    }

    /// Load an object the signer is allowed to change
    async fn owned(&self, signer: &str, id: &str) -> Result<(Object, Actor), AppError> {
        let (object, owner) = self.get(id).await?;
        if owner.username != signer {
            tracing::warn!(%signer, owner = %owner.username, object_id = %object.id, "Object access denied");
            return Err(AppError::Forbidden);
        }
        Ok((object, owner))
    }

    /// Create an object owned by `username`
    ///
    /// # Arguments
    /// * `object_type` - ActivityStreams type, `Note` when absent
    /// * `content` - HTML content, sanitized before storage
    pub async fn create(
        &self,
        username: &str,
        object_type: Option<&str>,
        content: &str,
    ) -> Result<Object, AppError> {
        let object_type = normalize_object_type(object_type)?;
        let content = sanitize_content(content);
        if content.trim().is_empty() {
            return Err(AppError::Validation("content is required".to_string()));
        }

        let actor = self.actor(username).await?;
        let object = Object::new(&actor.id, &object_type, content);
        let activity = object_activity(ActivityKind::Create, &actor, &object);

        self.db.insert_object_with_activity(&object, &activity).await?;
        tracing::info!(%username, object_id = %object.id, object_type = %object.object_type, "Object created");

        Ok(object)
    }

    /// Change an object's type or content
    ///
    /// # Errors
    /// - `NotFound` for unknown ids
    /// - `Forbidden` when `signer` does not own the object
    pub async fn update(
        &self,
        signer: &str,
        id: &str,
        object_type: Option<&str>,
        content: Option<&str>,
    ) -> Result<Object, AppError> {
        let (mut object, owner) = self.owned(signer, id).await?;

        if object_type.is_none() && content.is_none() {
            return Ok(object);
        }
        if object_type.is_some() {
            object.object_type = normalize_object_type(object_type)?;
        }
        if let Some(content) = content {
            let content = sanitize_content(content);
            if content.trim().is_empty() {
                return Err(AppError::Validation("content is required".to_string()));
            }
            object.content = content;
        }
        object.updated_at = chrono::Utc::now();

        let activity = object_activity(ActivityKind::Update, &owner, &object);
        if !self.db.update_object_with_activity(&object, &activity).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(%signer, object_id = %object.id, "Object updated");

        Ok(object)
    }

    /// Delete an object
    ///
    /// # Errors
    /// - `NotFound` for unknown ids
    /// - `Forbidden` when `signer` does not own the object
    pub async fn delete(&self, signer: &str, id: &str) -> Result<(), AppError> {
        let (object, owner) = self.owned(signer, id).await?;

        let activity = object_activity(ActivityKind::Delete, &owner, &object);
        if !self.db.delete_object_with_activity(&object.id, &activity).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(%signer, object_id = %object.id, "Object deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Vault;
    use tempfile::TempDir;

    async fn setup() -> (ObjectService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        for username in ["alice", "bob"] {
            let actor = Actor::new_local(username, "pub".to_string(), "https://example.com");
            let vault = Vault::new(&actor.id, "priv".to_string());
            db.create_actor_with_vault(&actor, &vault).await.unwrap();
        }
        (ObjectService::new(db.clone()), db, temp_dir)
    }

    async fn outbox_types(db: &Database, username: &str) -> Vec<String> {
        let actor = db.get_actor_by_username(username).await.unwrap().unwrap();
        db.get_activities_for_actor(&actor.id)
            .await
            .unwrap()
            .into_iter()
            .map(|activity| activity.activity_type)
            .collect()
    }

    #[test]
    fn content_is_sanitized() {
        let clean = sanitize_content(r#"<p onclick="x()">hi</p><script>alert(1)</script>"#);
        assert_eq!(clean, "<p>hi</p>");
    }

    #[test]
    fn object_type_defaults_and_validates() {
        assert_eq!(normalize_object_type(None).unwrap(), "Note");
        assert_eq!(normalize_object_type(Some(" ")).unwrap(), "Note");
        assert_eq!(normalize_object_type(Some("Article")).unwrap(), "Article");
        assert!(normalize_object_type(Some("<Note>")).is_err());
    }

    #[tokio::test]
    async fn create_records_create_activity() {
        let (service, db, _temp_dir) = setup().await;

        let object = service.create("alice", None, "<p>Hello</p>").await.unwrap();
        assert_eq!(object.object_type, "Note");

        let (stored, owner) = service.get(&object.id).await.unwrap();
        assert_eq!(stored.content, "<p>Hello</p>");
        assert_eq!(owner.username, "alice");
        assert_eq!(outbox_types(&db, "alice").await, vec!["Create"]);
    }

    #[tokio::test]
    async fn create_rejects_empty_content() {
        let (service, db, _temp_dir) = setup().await;

        assert!(matches!(
            service.create("alice", None, "<script>only</script>").await,
            Err(AppError::Validation(_))
        ));
        assert!(outbox_types(&db, "alice").await.is_empty());
    }

    #[tokio::test]
    async fn only_owner_may_update_or_delete() {
        let (service, db, _temp_dir) = setup().await;
        let object = service.create("alice", Some("Note"), "mine").await.unwrap();

        assert!(matches!(
            service.update("bob", &object.id, None, Some("yours")).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.delete("bob", &object.id).await,
            Err(AppError::Forbidden)
        ));
        assert_eq!(outbox_types(&db, "alice").await, vec!["Create"]);
        assert!(outbox_types(&db, "bob").await.is_empty());
    }

    #[tokio::test]
    async fn update_then_delete_records_activities() {
        let (service, db, _temp_dir) = setup().await;
        let object = service.create("alice", None, "draft").await.unwrap();

        let updated = service
            .update("alice", &object.id, Some("Article"), Some("final"))
            .await
            .unwrap();
        assert_eq!(updated.object_type, "Article");
        assert_eq!(updated.content, "final");

        service.delete("alice", &object.id).await.unwrap();
        assert!(matches!(service.get(&object.id).await, Err(AppError::NotFound)));

        assert_eq!(
            outbox_types(&db, "alice").await,
            vec!["Delete", "Update", "Create"]
        );
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids_are_not_found() {
        let (service, _db, _temp_dir) = setup().await;

        assert!(matches!(service.get("nope").await, Err(AppError::NotFound)));
        assert!(matches!(
            service.get(&EntityId::new().0).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.delete("alice", "nope").await,
            Err(AppError::NotFound)
        ));
    }
}
