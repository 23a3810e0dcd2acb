//! UsageRepository trait definition.
//!
//! Append-only audit trail of generation spend, decoupled from turn
//! persistence so accounting survives changes to message storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use colloquy_types::error::RepositoryError;
use colloquy_types::usage::UsageEvent;

/// Repository trait for the usage event audit trail.
///
/// Implementations live in colloquy-infra (e.g., `SqliteUsageRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait UsageRepository: Send + Sync {
    /// Append a usage event. Exactly one is recorded per completed
    /// generation.
    fn record(
        &self,
        event: &UsageEvent,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Sum of tokens recorded for an owner since `since`.
    fn total_tokens_since(
        &self,
        owner_id: &Uuid,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
