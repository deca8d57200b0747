//! Activity service
//!
//! Inbox intake and outbox reads.

use std::sync::Arc;

use crate::data::{Activity, Actor, Database};
use crate::error::AppError;
use crate::federation::activity_type_of;
use crate::metrics::ACTIVITYPUB_ACTIVITIES_RECEIVED;

/// Activity service
#[derive(Clone)]
pub struct ActivityService {
    db: Arc<Database>,
}

impl ActivityService {
    /// Create new activity service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store an inbound activity for `username`
    ///
    /// Any JSON document is accepted; its `type` becomes the activity
    /// type.
    ///
    /// # Errors
    /// - `NotFound` when the actor does not exist
    /// - `Validation` when the body is not JSON
    pub async fn receive(&self, username: &str, body: &[u8]) -> Result<Activity, AppError> {
        let actor = self
            .db
            .get_actor_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;

        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| AppError::Validation("Invalid JSON data".to_string()))?;

        let activity_type = activity_type_of(&payload);
        let activity = Activity::new(&actor.id, activity_type, &payload);
        self.db.insert_activity(&activity).await?;

        ACTIVITYPUB_ACTIVITIES_RECEIVED
            .with_label_values(&[activity_type])
            .inc();
        tracing::info!(
            %username,
            activity_type = %activity.activity_type,
            activity_id = %activity.id,
            "Activity received"
        );

        Ok(activity)
    }

    /// Actor and its activities, newest first
    pub async fn outbox(&self, username: &str) -> Result<(Actor, Vec<Activity>), AppError> {
        let actor = self
            .db
            .get_actor_by_username(username)
            .await?
            .ok_or(AppError::NotFound)?;
        let activities = self.db.get_activities_for_actor(&actor.id).await?;
        Ok((actor, activities))
    }
}
