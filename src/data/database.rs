//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Actors and vaults
    // =========================================================================

    /// Persist an actor together with its vault
    ///
    /// Both rows are written in one transaction: either the actor and
    /// its vault exist afterwards, or neither does.
    pub async fn create_actor_with_vault(
        &self,
        actor: &Actor,
        vault: &Vault,
    ) -> Result<(), AppError> {
        if vault.actor_id != actor.id {
            return Err(AppError::Validation(
                "vault must belong to the actor being created".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO actors (
                id, username, display_name, inbox, outbox, actor_type,
                public_key, bio, title, score, joined_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&actor.id)
        .bind(&actor.username)
        .bind(&actor.display_name)
        .bind(&actor.inbox)
        .bind(&actor.outbox)
        .bind(&actor.actor_type)
        .bind(&actor.public_key)
        .bind(&actor.bio)
        .bind(&actor.title)
        .bind(actor.score)
        .bind(actor.joined_at)
        .bind(actor.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO vaults (id, actor_id, private_key, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&vault.id)
        .bind(&vault.actor_id)
        .bind(&vault.private_key)
        .bind(vault.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get an actor by username
    pub async fn get_actor_by_username(&self, username: &str) -> Result<Option<Actor>, AppError> {
        let actor = sqlx::query_as::<_, Actor>("SELECT * FROM actors WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(actor)
    }

    /// Get an actor by id
    pub async fn get_actor(&self, id: &str) -> Result<Option<Actor>, AppError> {
        let actor = sqlx::query_as::<_, Actor>("SELECT * FROM actors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(actor)
    }

    /// Write the allow-listed profile fields of an actor.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching actor row exists.
    pub async fn update_actor_profile(&self, actor: &Actor) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE actors
            SET display_name = ?, bio = ?, title = ?, actor_type = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&actor.display_name)
        .bind(&actor.bio)
        .bind(&actor.title)
        .bind(&actor.actor_type)
        .bind(actor.updated_at)
        .bind(&actor.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Number of actors
    pub async fn count_actors(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM actors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get the vault of the actor with the given username
    pub async fn get_vault_by_username(&self, username: &str) -> Result<Option<Vault>, AppError> {
        let vault = sqlx::query_as::<_, Vault>(
            r#"
            SELECT vaults.* FROM vaults
            JOIN actors ON actors.id = vaults.actor_id
            WHERE actors.username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vault)
    }

    /// Number of vaults
    pub async fn count_vaults(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vaults")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Activities
    // =========================================================================

    /// Append an activity
    pub async fn insert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, actor_id, activity_type, object_data, published_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&activity.id)
        .bind(&activity.actor_id)
        .bind(&activity.activity_type)
        .bind(&activity.object_data)
        .bind(activity.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All activities of an actor, newest first
    ///
    /// Rows with the same timestamp come back in reverse insertion order.
    pub async fn get_activities_for_actor(&self, actor_id: &str) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE actor_id = ?
            ORDER BY published_at DESC, rowid DESC
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Get an object by id
    pub async fn get_object(&self, id: &str) -> Result<Option<Object>, AppError> {
        let object = sqlx::query_as::<_, Object>("SELECT * FROM objects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(object)
    }

    /// Insert an object and the activity announcing it
    pub async fn insert_object_with_activity(
        &self,
        object: &Object,
        activity: &Activity,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO objects (id, actor_id, object_type, content, published_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&object.id)
        .bind(&object.actor_id)
        .bind(&object.object_type)
        .bind(&object.content)
        .bind(object.published_at)
        .bind(object.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_activity_tx(&mut tx, activity).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Update an object's type and content and append the matching activity
    ///
    /// # Returns
    /// `true` if updated, `false` if the object no longer exists.
    pub async fn update_object_with_activity(
        &self,
        object: &Object,
        activity: &Activity,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE objects SET object_type = ?, content = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&object.object_type)
        .bind(&object.content)
        .bind(object.updated_at)
        .bind(&object.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_activity_tx(&mut tx, activity).await?;
        tx.commit().await?;

        Ok(true)
    }

    /// Delete an object and append the matching activity
    ///
    /// # Returns
    /// `true` if deleted, `false` if the object did not exist.
    pub async fn delete_object_with_activity(
        &self,
        id: &str,
        activity: &Activity,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM objects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_activity_tx(&mut tx, activity).await?;
        tx.commit().await?;

        Ok(true)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Store a newly issued token
    pub async fn insert_token(&self, token: &Token) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, actor_id, access_token, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.actor_id)
        .bind(&token.access_token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look a token up by its bearer value
    pub async fn get_token(&self, access_token: &str) -> Result<Option<Token>, AppError> {
        let token = sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE access_token = ?")
            .bind(access_token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(token)
    }

    /// Replace a token's value and expiry, guarded by its previous value
    ///
    /// # Returns
    /// `true` if updated, `false` if the token was refreshed concurrently.
    pub async fn update_token_value(
        &self,
        id: &str,
        previous_access_token: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens SET access_token = ?, expires_at = ?
            WHERE id = ? AND access_token = ?
            "#,
        )
        .bind(access_token)
        .bind(expires_at)
        .bind(id)
        .bind(previous_access_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

async fn insert_activity_tx(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    activity: &Activity,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO activities (id, actor_id, activity_type, object_data, published_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&activity.id)
    .bind(&activity.actor_id)
    .bind(&activity.activity_type)
    .bind(&activity.object_data)
    .bind(activity.published_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
