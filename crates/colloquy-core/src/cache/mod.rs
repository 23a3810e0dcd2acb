//! Thread-list cache trait.
//!
//! A small port so the backing store (in-process map, external cache) is
//! swappable without touching the chat service or thread store. The cache
//! is a latency optimization only -- never consulted for access control.

use std::time::Duration;

use uuid::Uuid;

use colloquy_types::chat::ThreadSummary;

/// Read-through cache of per-owner thread summaries.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in colloquy-infra.
pub trait ThreadListCache: Send + Sync {
    /// Get the cached summaries for an owner. Returns None on a miss or an
    /// expired entry.
    fn get(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Option<Vec<ThreadSummary>>> + Send;

    /// Store an owner's summaries with a time-to-live.
    fn put(
        &self,
        owner_id: &Uuid,
        summaries: Vec<ThreadSummary>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = ()> + Send;

    /// Drop the owner's entry. No-op when absent.
    fn invalidate(&self, owner_id: &Uuid) -> impl std::future::Future<Output = ()> + Send;
}
