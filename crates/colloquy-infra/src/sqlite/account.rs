//! SQLite account repository implementation.
//!
//! Implements `QuotaRepository` from `colloquy-core` using sqlx with split
//! read/write pools. Both mutating operations are single conditional
//! UPDATE statements; the single-connection writer pool serializes them,
//! which is what makes a racing deduct lose cleanly instead of driving the
//! balance negative.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use colloquy_core::quota::QuotaRepository;
use colloquy_types::account::{MembershipTier, UserAccount};
use colloquy_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `QuotaRepository`.
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain UserAccount.
struct UserAccountRow {
    id: String,
    membership_tier: String,
    remaining_units: i64,
    units_reset_at: Option<String>,
    created_at: String,
}

impl UserAccountRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            membership_tier: row.try_get("membership_tier")?,
            remaining_units: row.try_get("remaining_units")?,
            units_reset_at: row.try_get("units_reset_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_account(self) -> Result<UserAccount, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        let membership_tier: MembershipTier = self
            .membership_tier
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let units_reset_at = self
            .units_reset_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(UserAccount {
            id,
            membership_tier,
            remaining_units: self.remaining_units,
            units_reset_at,
            created_at,
        })
    }
}

impl QuotaRepository for SqliteAccountRepository {
    async fn find_account(&self, user_id: &Uuid) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, membership_tier, remaining_units, units_reset_at, created_at FROM users WHERE id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let account_row = UserAccountRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(account_row.into_account()?))
            }
            None => Ok(None),
        }
    }

    async fn apply_reset(
        &self,
        user_id: &Uuid,
        units: i64,
        reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE users
               SET remaining_units = ?, units_reset_at = ?
               WHERE id = ? AND (units_reset_at IS NULL OR units_reset_at < ?)"#,
        )
        .bind(units)
        .bind(format_datetime(&reset_at))
        .bind(user_id.to_string())
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn deduct_if_available(
        &self,
        user_id: &Uuid,
        tokens: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE users
               SET remaining_units = remaining_units - ?
               WHERE id = ? AND remaining_units >= ?"#,
        )
        .bind(tokens)
        .bind(user_id.to_string())
        .bind(tokens)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn insert_user(
        pool: &DatabasePool,
        tier: MembershipTier,
        remaining: i64,
        reset_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO users (id, api_key_hash, membership_tier, remaining_units, units_reset_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(format!("hash-{id}"))
        .bind(tier.to_string())
        .bind(remaining)
        .bind(reset_at.as_ref().map(format_datetime))
        .bind(format_datetime(&Utc::now()))
        .execute(&pool.writer)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_find_account_roundtrip() {
        let pool = test_pool().await;
        let reset_at = Utc::now() + chrono::Duration::days(5);
        let user_id = insert_user(&pool, MembershipTier::Basic, 42, Some(reset_at)).await;

        let repo = SqliteAccountRepository::new(pool);
        let account = repo.find_account(&user_id).await.unwrap().unwrap();
        assert_eq!(account.membership_tier, MembershipTier::Basic);
        assert_eq!(account.remaining_units, 42);
        assert_eq!(
            account.units_reset_at.unwrap().timestamp(),
            reset_at.timestamp()
        );

        assert!(repo.find_account(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_reset_only_when_due() {
        let pool = test_pool().await;
        let now = Utc::now();
        let user_id = insert_user(&pool, MembershipTier::Free, 0, None).await;
        let repo = SqliteAccountRepository::new(pool);

        // Due (unset): applies.
        let next_reset = now + chrono::Duration::days(30);
        assert!(repo.apply_reset(&user_id, 1_000, next_reset, now).await.unwrap());

        // Not due anymore: conditional guard refuses a second reset.
        assert!(!repo.apply_reset(&user_id, 1_000, next_reset, now).await.unwrap());

        let account = repo.find_account(&user_id).await.unwrap().unwrap();
        assert_eq!(account.remaining_units, 1_000);
    }

    #[tokio::test]
    async fn test_deduct_conditional() {
        let pool = test_pool().await;
        let reset_at = Utc::now() + chrono::Duration::days(5);
        let user_id = insert_user(&pool, MembershipTier::Free, 100, Some(reset_at)).await;
        let repo = SqliteAccountRepository::new(pool);

        assert!(repo.deduct_if_available(&user_id, 60).await.unwrap());
        assert!(!repo.deduct_if_available(&user_id, 60).await.unwrap());

        let account = repo.find_account(&user_id).await.unwrap().unwrap();
        assert_eq!(account.remaining_units, 40);
    }

    #[tokio::test]
    async fn test_concurrent_deducts_exactly_one_wins() {
        let pool = test_pool().await;
        let reset_at = Utc::now() + chrono::Duration::days(5);
        let user_id = insert_user(&pool, MembershipTier::Free, 1_000, Some(reset_at)).await;
        let repo = Arc::new(SqliteAccountRepository::new(pool));

        let a = tokio::spawn({
            let repo = Arc::clone(&repo);
            async move { repo.deduct_if_available(&user_id, 600).await.unwrap() }
        });
        let b = tokio::spawn({
            let repo = Arc::clone(&repo);
            async move { repo.deduct_if_available(&user_id, 600).await.unwrap() }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a ^ b, "exactly one of two racing deducts must apply");

        let account = repo.find_account(&user_id).await.unwrap().unwrap();
        assert_eq!(account.remaining_units, 400);
    }
}
