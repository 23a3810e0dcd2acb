//! ThreadRepository trait definition.
//!
//! CRUD operations for chat threads and their turns.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use colloquy_types::chat::{ChatThread, ChatTurn, ThreadSummary};
use colloquy_types::error::RepositoryError;

/// Repository trait for thread and turn persistence.
///
/// Implementations live in colloquy-infra (e.g., `SqliteThreadRepository`).
pub trait ThreadRepository: Send + Sync {
    /// Create a new thread.
    fn create_thread(
        &self,
        thread: &ChatThread,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a thread by its unique ID.
    fn get_thread(
        &self,
        thread_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatThread>, RepositoryError>> + Send;

    /// Bump a thread's `updated_at` (recency).
    fn touch_thread(
        &self,
        thread_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace a thread's title and bump its recency.
    fn rename_thread(
        &self,
        thread_id: &Uuid,
        title: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a completed turn to its thread.
    fn append_turn(
        &self,
        turn: &ChatTurn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a thread's turns, ordered by created_at ASC.
    fn get_turns(
        &self,
        thread_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatTurn>, RepositoryError>> + Send;

    /// List an owner's thread summaries, ordered by updated_at DESC.
    fn list_summaries(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadSummary>, RepositoryError>> + Send;
}
