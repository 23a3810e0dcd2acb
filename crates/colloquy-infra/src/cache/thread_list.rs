//! In-process thread-list cache on DashMap.
//!
//! Entries carry an absolute expiry instant; expired entries read as
//! misses and are evicted lazily on the read path. The cache is a latency
//! optimization only and holds no authoritative state.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use colloquy_core::cache::ThreadListCache;
use colloquy_types::chat::ThreadSummary;

struct CacheEntry {
    expires_at: Instant,
    summaries: Vec<ThreadSummary>,
}

/// DashMap-backed implementation of `ThreadListCache`.
#[derive(Default)]
pub struct InMemoryThreadListCache {
    entries: DashMap<Uuid, CacheEntry>,
}

impl InMemoryThreadListCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThreadListCache for InMemoryThreadListCache {
    async fn get(&self, owner_id: &Uuid) -> Option<Vec<ThreadSummary>> {
        if let Some(entry) = self.entries.get(owner_id) {
            if entry.expires_at > Instant::now() {
                return Some(entry.summaries.clone());
            }
        }
        // Evict lazily; re-check expiry so a concurrent fresh put survives.
        self.entries
            .remove_if(owner_id, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    async fn put(&self, owner_id: &Uuid, summaries: Vec<ThreadSummary>, ttl: Duration) {
        self.entries.insert(
            *owner_id,
            CacheEntry {
                expires_at: Instant::now() + ttl,
                summaries,
            },
        );
    }

    async fn invalidate(&self, owner_id: &Uuid) {
        self.entries.remove(owner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_summary(title: &str) -> ThreadSummary {
        ThreadSummary {
            id: Uuid::now_v7(),
            title: title.to_string(),
            updated_at: Utc::now(),
            turn_count: 1,
            last_user_text: Some("hi".to_string()),
            last_model_text: Some("hello".to_string()),
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let cache = InMemoryThreadListCache::new();
        let owner = Uuid::now_v7();

        assert!(cache.get(&owner).await.is_none());

        cache
            .put(&owner, vec![make_summary("a")], Duration::from_secs(60))
            .await;
        let cached = cache.get(&owner).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].title, "a");
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryThreadListCache::new();
        let owner = Uuid::now_v7();

        cache
            .put(&owner, vec![make_summary("a")], Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get(&owner).await.is_none());
        // And the entry was evicted, not just hidden.
        assert!(cache.entries.get(&owner).is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = InMemoryThreadListCache::new();
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();

        cache
            .put(&owner, vec![make_summary("a")], Duration::from_secs(60))
            .await;
        cache
            .put(&other, vec![make_summary("b")], Duration::from_secs(60))
            .await;

        cache.invalidate(&owner).await;
        assert!(cache.get(&owner).await.is_none());
        // Other owners are untouched.
        assert!(cache.get(&other).await.is_some());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let cache = InMemoryThreadListCache::new();
        let owner = Uuid::now_v7();

        cache
            .put(&owner, vec![make_summary("old")], Duration::from_secs(60))
            .await;
        cache
            .put(&owner, vec![make_summary("new")], Duration::from_secs(60))
            .await;

        let cached = cache.get(&owner).await.unwrap();
        assert_eq!(cached[0].title, "new");
    }
}
