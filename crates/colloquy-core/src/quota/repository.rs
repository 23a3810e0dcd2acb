//! QuotaRepository trait definition.
//!
//! Persistence port for the quota fields of a user account. Both mutating
//! operations are conditional single-statement updates, never
//! read-then-write pairs, so concurrent requests cannot interleave between
//! check and act.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use colloquy_types::account::UserAccount;
use colloquy_types::error::RepositoryError;

/// Repository trait for user quota persistence.
///
/// Implementations live in colloquy-infra (e.g., `SqliteAccountRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait QuotaRepository: Send + Sync {
    /// Load an account with its quota fields.
    fn find_account(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<UserAccount>, RepositoryError>> + Send;

    /// Reset the balance to `units` and the reset boundary to `reset_at`,
    /// but only if the reset is still due at `now` (unset or past
    /// `units_reset_at`). Returns whether the reset applied; concurrent
    /// resets collapse to one.
    fn apply_reset(
        &self,
        user_id: &Uuid,
        units: i64,
        reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Decrement the balance by `tokens` only if the current balance covers
    /// it. Returns whether the decrement applied; the balance is never
    /// driven below zero.
    fn deduct_if_available(
        &self,
        user_id: &Uuid,
        tokens: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
