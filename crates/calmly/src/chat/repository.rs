//! Repository for session and message persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use super::db::ChatDb;
use super::models::{ChatMessage, MessageMetadata, MessageRole, Session, SessionSummary};

#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, FromRow)]
struct SessionSummaryRow {
    session_id: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    role: String,
    content: String,
    metadata: Option<String>,
    timestamp: i64,
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("parsing stored timestamp: {}", raw))
}

impl MessageRow {
    fn into_message(self) -> Result<ChatMessage> {
        let metadata: Option<MessageMetadata> = match self.metadata {
            Some(raw) => Some(serde_json::from_str(&raw).context("parsing message metadata")?),
            None => None,
        };

        Ok(ChatMessage {
            role: self
                .role
                .parse::<MessageRole>()
                .map_err(|e| anyhow::anyhow!(e))?,
            content: self.content,
            timestamp: DateTime::from_timestamp_millis(self.timestamp)
                .context("message timestamp out of range")?,
            metadata,
        })
    }
}

/// Repository for chat sessions and their messages.
#[derive(Debug, Clone)]
pub struct ChatRepository {
    db: ChatDb,
}

impl ChatRepository {
    /// Create a new repository instance.
    pub fn new(db: ChatDb) -> Self {
        Self { db }
    }

    /// Persist a freshly created session.
    pub async fn create(&self, user_id: &str, session_id: &str) -> Result<Session> {
        let now = Utc::now();
        let ts = format_ts(now);

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(&ts)
        .bind(&ts)
        .execute(self.db.pool())
        .await
        .context("inserting session")?;

        Ok(Session {
            session_id: session_id.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch a session with its full ordered message list.
    pub async fn get(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT session_id, created_at, updated_at FROM sessions WHERE session_id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await
        .context("fetching session")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let messages = self.fetch_messages(session_id).await?;

        Ok(Some(Session {
            session_id: row.session_id,
            messages,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        }))
    }

    /// Fetch the ordered message history. Returns `None` when the session
    /// is unknown, as opposed to an existing session with no messages.
    pub async fn history(&self, user_id: &str, session_id: &str) -> Result<Option<Vec<ChatMessage>>> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions WHERE session_id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await
        .context("checking session existence")?;

        if exists == 0 {
            return Ok(None);
        }

        Ok(Some(self.fetch_messages(session_id).await?))
    }

    async fn fetch_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT role, content, metadata, timestamp
            FROM messages
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.db.pool())
        .await
        .context("fetching messages")?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// List session summaries, most recently updated first. The session id
    /// tiebreak keeps the order stable across repeated calls.
    pub async fn list(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let rows = sqlx::query_as::<_, SessionSummaryRow>(
            r#"
            SELECT s.session_id, s.created_at, s.updated_at,
                   (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.session_id) AS message_count
            FROM sessions s
            WHERE s.user_id = ?
            ORDER BY s.updated_at DESC, s.session_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .context("listing sessions")?;

        rows.into_iter()
            .map(|row| {
                Ok(SessionSummary {
                    session_id: row.session_id,
                    created_at: parse_ts(&row.created_at)?,
                    updated_at: parse_ts(&row.updated_at)?,
                    message_count: row.message_count,
                })
            })
            .collect()
    }

    /// Append a message atomically: the insert and the `updated_at` bump
    /// commit together or not at all. The message timestamp is clamped to
    /// the session's latest so timestamps never decrease within a session.
    ///
    /// Returns `None` when the session is unknown.
    pub async fn append_message(
        &self,
        user_id: &str,
        session_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<&MessageMetadata>,
    ) -> Result<Option<ChatMessage>> {
        let now_ms = Utc::now().timestamp_millis();
        let metadata_json = match metadata {
            Some(meta) => Some(serde_json::to_string(meta).context("serializing metadata")?),
            None => None,
        };

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("starting append transaction")?;

        // The first statement is a write, so the transaction takes the
        // write lock up front and concurrent appends queue behind it.
        let assigned_ts = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO messages (session_id, role, content, metadata, timestamp)
            SELECT ?1, ?2, ?3, ?4,
                   MAX(?5, COALESCE((SELECT MAX(timestamp) FROM messages WHERE session_id = ?1), 0))
            WHERE EXISTS (SELECT 1 FROM sessions WHERE session_id = ?1 AND user_id = ?6)
            RETURNING timestamp
            "#,
        )
        .bind(session_id)
        .bind(role.to_string())
        .bind(content)
        .bind(&metadata_json)
        .bind(now_ms)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("inserting message")?;

        let Some(assigned_ts) = assigned_ts else {
            // Unknown session; nothing was inserted.
            return Ok(None);
        };

        let timestamp =
            DateTime::from_timestamp_millis(assigned_ts).context("assigned timestamp out of range")?;

        sqlx::query("UPDATE sessions SET updated_at = ? WHERE session_id = ?")
            .bind(format_ts(timestamp))
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .context("bumping session updated_at")?;

        tx.commit().await.context("committing append")?;

        Ok(Some(ChatMessage {
            role,
            content: content.to_string(),
            timestamp,
            metadata: metadata.cloned(),
        }))
    }
}
