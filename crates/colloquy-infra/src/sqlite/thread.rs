//! SQLite thread repository implementation.
//!
//! Implements `ThreadRepository` from `colloquy-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, rfc3339 datetime
//! mapping.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use colloquy_core::thread::ThreadRepository;
use colloquy_types::chat::{ChatThread, ChatTurn, ThreadSummary};
use colloquy_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ThreadRepository`.
pub struct SqliteThreadRepository {
    pool: DatabasePool,
}

impl SqliteThreadRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatThread.
struct ChatThreadRow {
    id: String,
    owner_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatThreadRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_thread(self) -> Result<ChatThread, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid thread id: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| RepositoryError::Query(format!("invalid owner_id: {e}")))?;
        Ok(ChatThread {
            id,
            owner_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatTurn.
struct ChatTurnRow {
    id: String,
    thread_id: String,
    owner_id: String,
    user_text: String,
    model_text: String,
    tokens_used: i64,
    model: String,
    created_at: String,
}

impl ChatTurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            thread_id: row.try_get("thread_id")?,
            owner_id: row.try_get("owner_id")?,
            user_text: row.try_get("user_text")?,
            model_text: row.try_get("model_text")?,
            tokens_used: row.try_get("tokens_used")?,
            model: row.try_get("model")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_turn(self) -> Result<ChatTurn, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let thread_id = Uuid::parse_str(&self.thread_id)
            .map_err(|e| RepositoryError::Query(format!("invalid thread_id: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| RepositoryError::Query(format!("invalid owner_id: {e}")))?;
        Ok(ChatTurn {
            id,
            thread_id,
            owner_id,
            user_text: self.user_text,
            model_text: self.model_text,
            tokens_used: self.tokens_used as u32,
            model: self.model,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ThreadRepository implementation
// ---------------------------------------------------------------------------

impl ThreadRepository for SqliteThreadRepository {
    async fn create_thread(&self, thread: &ChatThread) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_threads (id, owner_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(thread.id.to_string())
        .bind(thread.owner_id.to_string())
        .bind(&thread.title)
        .bind(format_datetime(&thread.created_at))
        .bind(format_datetime(&thread.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_thread(&self, thread_id: &Uuid) -> Result<Option<ChatThread>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_threads WHERE id = ?")
            .bind(thread_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let thread_row = ChatThreadRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(thread_row.into_thread()?))
            }
            None => Ok(None),
        }
    }

    async fn touch_thread(
        &self,
        thread_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_threads SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(thread_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn rename_thread(
        &self,
        thread_id: &Uuid,
        title: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_threads SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&at))
            .bind(thread_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_turn(&self, turn: &ChatTurn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_turns (id, thread_id, owner_id, user_text, model_text, tokens_used, model, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(turn.thread_id.to_string())
        .bind(turn.owner_id.to_string())
        .bind(&turn.user_text)
        .bind(&turn.model_text)
        .bind(turn.tokens_used as i64)
        .bind(&turn.model)
        .bind(format_datetime(&turn.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_turns(&self, thread_id: &Uuid) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM chat_turns WHERE thread_id = ? ORDER BY created_at ASC")
                .bind(thread_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let turn_row = ChatTurnRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            turns.push(turn_row.into_turn()?);
        }

        Ok(turns)
    }

    async fn list_summaries(&self, owner_id: &Uuid) -> Result<Vec<ThreadSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT t.id, t.title, t.updated_at,
                      (SELECT COUNT(*) FROM chat_turns c WHERE c.thread_id = t.id) AS turn_count,
                      (SELECT c.user_text FROM chat_turns c WHERE c.thread_id = t.id
                       ORDER BY c.created_at DESC LIMIT 1) AS last_user_text,
                      (SELECT c.model_text FROM chat_turns c WHERE c.thread_id = t.id
                       ORDER BY c.created_at DESC LIMIT 1) AS last_model_text
               FROM chat_threads t
               WHERE t.owner_id = ?
               ORDER BY t.updated_at DESC"#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let title: String = row
                .try_get("title")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let updated_at: String = row
                .try_get("updated_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let turn_count: i64 = row
                .try_get("turn_count")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let last_user_text: Option<String> = row
                .try_get("last_user_text")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let last_model_text: Option<String> = row
                .try_get("last_model_text")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            summaries.push(ThreadSummary {
                id: Uuid::parse_str(&id)
                    .map_err(|e| RepositoryError::Query(format!("invalid thread id: {e}")))?,
                title,
                updated_at: parse_datetime(&updated_at)?,
                turn_count: turn_count as u32,
                last_user_text,
                last_model_text,
            });
        }

        Ok(summaries)
    }
}
