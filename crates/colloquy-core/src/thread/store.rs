//! Thread store: ownership enforcement, lazy creation, history, renames.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use colloquy_types::chat::{ChatThread, ChatTurn, ThreadSummary};
use colloquy_types::error::ChatError;

use crate::thread::repository::ThreadRepository;

/// Maximum length of a thread title, in characters.
const MAX_TITLE_CHARS: usize = 255;

/// Durable conversation threads and their ordered turns.
///
/// Generic over [`ThreadRepository`]. Every thread-scoped read or write
/// goes through [`ThreadStore::assert_ownership`] first.
pub struct ThreadStore<R: ThreadRepository> {
    repo: R,
}

impl<R: ThreadRepository> ThreadStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a thread for `owner_id`, seeding the title from the first
    /// message (truncated to 255 characters on a char boundary).
    pub async fn create_thread(
        &self,
        owner_id: Uuid,
        seed_title: &str,
    ) -> Result<ChatThread, ChatError> {
        let now = Utc::now();
        let thread = ChatThread {
            id: Uuid::now_v7(),
            owner_id,
            title: truncate_title(seed_title),
            created_at: now,
            updated_at: now,
        };
        self.repo.create_thread(&thread).await?;
        info!(thread_id = %thread.id, owner_id = %owner_id, "thread created");
        Ok(thread)
    }

    /// Verify that `thread_id` exists and belongs to `owner_id`.
    ///
    /// Fails with `Forbidden` for both a missing thread and a foreign
    /// owner, so callers cannot probe for thread existence.
    pub async fn assert_ownership(
        &self,
        thread_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<ChatThread, ChatError> {
        match self.repo.get_thread(thread_id).await? {
            Some(thread) if thread.owner_id == *owner_id => Ok(thread),
            _ => Err(ChatError::Forbidden),
        }
    }

    /// A thread's turns in creation order. Callers must have asserted
    /// ownership first.
    pub async fn load_history(&self, thread_id: &Uuid) -> Result<Vec<ChatTurn>, ChatError> {
        Ok(self.repo.get_turns(thread_id).await?)
    }

    /// Persist a completed turn.
    pub async fn append_turn(&self, turn: &ChatTurn) -> Result<(), ChatError> {
        Ok(self.repo.append_turn(turn).await?)
    }

    /// Bump a thread's recency.
    pub async fn touch(&self, thread_id: &Uuid) -> Result<(), ChatError> {
        Ok(self.repo.touch_thread(thread_id, Utc::now()).await?)
    }

    /// Rename a thread, ownership-checked.
    pub async fn rename_thread(
        &self,
        thread_id: &Uuid,
        owner_id: &Uuid,
        new_title: &str,
    ) -> Result<(), ChatError> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(ChatError::InvalidInput(
                "title must not be empty".to_string(),
            ));
        }
        self.assert_ownership(thread_id, owner_id).await?;
        self.repo
            .rename_thread(thread_id, &truncate_title(title), Utc::now())
            .await?;
        info!(thread_id = %thread_id, "thread renamed");
        Ok(())
    }

    /// An owner's thread summaries, newest-updated first.
    pub async fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<ThreadSummary>, ChatError> {
        Ok(self.repo.list_summaries(owner_id).await?)
    }
}

/// Truncate a title seed to [`MAX_TITLE_CHARS`] characters without
/// splitting a multi-byte char.
fn truncate_title(seed: &str) -> String {
    seed.chars().take(MAX_TITLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use colloquy_types::error::RepositoryError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeThreadRepo {
        threads: Mutex<HashMap<Uuid, ChatThread>>,
        turns: Mutex<Vec<ChatTurn>>,
    }

    impl ThreadRepository for FakeThreadRepo {
        async fn create_thread(&self, thread: &ChatThread) -> Result<(), RepositoryError> {
            self.threads
                .lock()
                .unwrap()
                .insert(thread.id, thread.clone());
            Ok(())
        }

        async fn get_thread(&self, thread_id: &Uuid) -> Result<Option<ChatThread>, RepositoryError> {
            Ok(self.threads.lock().unwrap().get(thread_id).cloned())
        }

        async fn touch_thread(
            &self,
            thread_id: &Uuid,
            at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            if let Some(thread) = self.threads.lock().unwrap().get_mut(thread_id) {
                thread.updated_at = at;
            }
            Ok(())
        }

        async fn rename_thread(
            &self,
            thread_id: &Uuid,
            title: &str,
            at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            match self.threads.lock().unwrap().get_mut(thread_id) {
                Some(thread) => {
                    thread.title = title.to_string();
                    thread.updated_at = at;
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        }

        async fn append_turn(&self, turn: &ChatTurn) -> Result<(), RepositoryError> {
            self.turns.lock().unwrap().push(turn.clone());
            Ok(())
        }

        async fn get_turns(&self, thread_id: &Uuid) -> Result<Vec<ChatTurn>, RepositoryError> {
            Ok(self
                .turns
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.thread_id == *thread_id)
                .cloned()
                .collect())
        }

        async fn list_summaries(
            &self,
            owner_id: &Uuid,
        ) -> Result<Vec<ThreadSummary>, RepositoryError> {
            let mut summaries: Vec<ThreadSummary> = self
                .threads
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.owner_id == *owner_id)
                .map(|t| ThreadSummary {
                    id: t.id,
                    title: t.title.clone(),
                    updated_at: t.updated_at,
                    turn_count: 0,
                    last_user_text: None,
                    last_model_text: None,
                })
                .collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        }
    }

    #[tokio::test]
    async fn test_ownership_forbidden_for_missing_and_foreign() {
        let store = ThreadStore::new(FakeThreadRepo::default());
        let owner_a = Uuid::now_v7();
        let owner_b = Uuid::now_v7();

        // Missing thread
        let missing = Uuid::now_v7();
        assert!(matches!(
            store.assert_ownership(&missing, &owner_b).await,
            Err(ChatError::Forbidden)
        ));

        // Foreign thread: identical error
        let thread = store.create_thread(owner_a, "hello").await.unwrap();
        assert!(matches!(
            store.assert_ownership(&thread.id, &owner_b).await,
            Err(ChatError::Forbidden)
        ));

        // Owner passes
        assert!(store.assert_ownership(&thread.id, &owner_a).await.is_ok());
    }

    #[tokio::test]
    async fn test_title_truncated_on_char_boundary() {
        let store = ThreadStore::new(FakeThreadRepo::default());
        let seed = "é".repeat(300);
        let thread = store.create_thread(Uuid::now_v7(), &seed).await.unwrap();
        assert_eq!(thread.title.chars().count(), 255);
    }

    #[tokio::test]
    async fn test_rename_rejects_empty_title() {
        let store = ThreadStore::new(FakeThreadRepo::default());
        let owner = Uuid::now_v7();
        let thread = store.create_thread(owner, "hello").await.unwrap();
        let result = store.rename_thread(&thread.id, &owner, "   ").await;
        assert!(matches!(result, Err(ChatError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rename_checks_ownership_before_write() {
        let store = ThreadStore::new(FakeThreadRepo::default());
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();
        let thread = store.create_thread(owner, "hello").await.unwrap();

        let result = store.rename_thread(&thread.id, &intruder, "stolen").await;
        assert!(matches!(result, Err(ChatError::Forbidden)));

        store
            .rename_thread(&thread.id, &owner, "renamed")
            .await
            .unwrap();
        let thread = store.assert_ownership(&thread.id, &owner).await.unwrap();
        assert_eq!(thread.title, "renamed");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = ThreadStore::new(FakeThreadRepo::default());
        let owner = Uuid::now_v7();
        let first = store.create_thread(owner, "first").await.unwrap();
        let second = store.create_thread(owner, "second").await.unwrap();
        store.touch(&first.id).await.unwrap();

        let summaries = store.list_for_owner(&owner).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, first.id);
        assert_eq!(summaries[1].id, second.id);
    }
}
