//! Repository for activity persistence.

use anyhow::{Context, Result};
use chrono::DateTime;
use sqlx::FromRow;

use crate::chat::ChatDb;

use super::models::{Activity, ActivityType};

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: String,
    user_id: String,
    #[sqlx(rename = "type")]
    activity_type: String,
    name: String,
    description: Option<String>,
    duration: i64,
    difficulty: Option<String>,
    feedback: Option<String>,
    timestamp: i64,
}

impl ActivityRow {
    fn into_activity(self) -> Result<Activity> {
        Ok(Activity {
            id: self.id,
            user_id: self.user_id,
            activity_type: self
                .activity_type
                .parse::<ActivityType>()
                .map_err(|e| anyhow::anyhow!(e))?,
            name: self.name,
            description: self.description,
            duration: self.duration,
            difficulty: self.difficulty,
            feedback: self.feedback,
            timestamp: DateTime::from_timestamp_millis(self.timestamp)
                .context("activity timestamp out of range")?,
        })
    }
}

/// Repository for activity records.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    db: ChatDb,
}

impl ActivityRepository {
    /// Create a new repository instance.
    pub fn new(db: ChatDb) -> Self {
        Self { db }
    }

    /// Insert an activity. Records are never updated afterwards.
    pub async fn insert(&self, activity: &Activity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, type, name, description, duration, difficulty, feedback, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&activity.id)
        .bind(&activity.user_id)
        .bind(activity.activity_type.to_string())
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.duration)
        .bind(&activity.difficulty)
        .bind(&activity.feedback)
        .bind(activity.timestamp.timestamp_millis())
        .execute(self.db.pool())
        .await
        .context("inserting activity")?;

        Ok(())
    }

    /// List a user's activities within an inclusive millisecond window,
    /// newest first.
    pub async fn list_between(
        &self,
        user_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, user_id, type, name, description, duration, difficulty, feedback, timestamp
            FROM activities
            WHERE user_id = ? AND timestamp BETWEEN ? AND ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(self.db.pool())
        .await
        .context("listing activities")?;

        rows.into_iter().map(ActivityRow::into_activity).collect()
    }
}
