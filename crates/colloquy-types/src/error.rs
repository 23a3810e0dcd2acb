//! Error taxonomy for the chat core.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in
/// colloquy-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by chat-turn orchestration.
///
/// `InvalidInput`, `Forbidden`, and `QuotaExhausted` are all rejected
/// before any generation cost is incurred. A failed post-generation deduct
/// is not an error here -- it is logged and counted as an accounting
/// anomaly without failing the already-delivered answer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Thread access by a non-owner, or a missing thread. One variant for
    /// both cases so responses do not leak thread existence.
    #[error("access to this thread is forbidden")]
    Forbidden,

    #[error("quota exhausted for this billing period")]
    QuotaExhausted {
        reset_at: Option<DateTime<Utc>>,
    },

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
