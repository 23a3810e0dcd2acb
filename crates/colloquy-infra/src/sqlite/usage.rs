//! SQLite usage event repository implementation.
//!
//! Append-only writes plus the period aggregation used by the quota
//! status endpoint.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use colloquy_core::usage::UsageRepository;
use colloquy_types::error::RepositoryError;
use colloquy_types::usage::UsageEvent;

use super::pool::DatabasePool;
use super::format_datetime;

/// SQLite-backed implementation of `UsageRepository`.
pub struct SqliteUsageRepository {
    pool: DatabasePool,
}

impl SqliteUsageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UsageRepository for SqliteUsageRepository {
    async fn record(&self, event: &UsageEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO usage_events (id, owner_id, model, tokens_used, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(event.owner_id.to_string())
        .bind(&event.model)
        .bind(event.tokens_used as i64)
        .bind(format_datetime(&event.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn total_tokens_since(
        &self,
        owner_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT COALESCE(SUM(tokens_used), 0) AS total
               FROM usage_events
               WHERE owner_id = ? AND created_at >= ?"#,
        )
        .bind(owner_id.to_string())
        .bind(format_datetime(&since))
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(total as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_types::account::MembershipTier;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn insert_user(pool: &DatabasePool) -> Uuid {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO users (id, api_key_hash, membership_tier, remaining_units, units_reset_at, created_at)
               VALUES (?, ?, ?, ?, NULL, ?)"#,
        )
        .bind(id.to_string())
        .bind(format!("hash-{id}"))
        .bind(MembershipTier::Free.to_string())
        .bind(1_000i64)
        .bind(format_datetime(&Utc::now()))
        .execute(&pool.writer)
        .await
        .unwrap();
        id
    }

    fn make_event(owner_id: Uuid, tokens: u32, created_at: DateTime<Utc>) -> UsageEvent {
        UsageEvent {
            id: Uuid::now_v7(),
            owner_id,
            model: "claude-sonnet-4-20250514".to_string(),
            tokens_used: tokens,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_record_and_sum_within_period() {
        let pool = test_pool().await;
        let owner_id = insert_user(&pool).await;
        let repo = SqliteUsageRepository::new(pool);

        let now = Utc::now();
        repo.record(&make_event(owner_id, 100, now)).await.unwrap();
        repo.record(&make_event(owner_id, 50, now)).await.unwrap();
        // Outside the window
        repo.record(&make_event(owner_id, 999, now - chrono::Duration::days(40)))
            .await
            .unwrap();

        let total = repo
            .total_tokens_since(&owner_id, now - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(total, 150);
    }

    #[tokio::test]
    async fn test_sum_scoped_to_owner() {
        let pool = test_pool().await;
        let owner_a = insert_user(&pool).await;
        let owner_b = insert_user(&pool).await;
        let repo = SqliteUsageRepository::new(pool);

        let now = Utc::now();
        repo.record(&make_event(owner_a, 10, now)).await.unwrap();
        repo.record(&make_event(owner_b, 20, now)).await.unwrap();

        let total = repo
            .total_tokens_since(&owner_a, now - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn test_sum_empty_is_zero() {
        let pool = test_pool().await;
        let owner_id = insert_user(&pool).await;
        let repo = SqliteUsageRepository::new(pool);

        let total = repo
            .total_tokens_since(&owner_id, Utc::now() - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
