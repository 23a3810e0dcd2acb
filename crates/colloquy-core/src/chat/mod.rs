//! Chat turn orchestration.
//!
//! `ChatService` coordinates the quota ledger, thread store, context
//! assembler, generation provider, and thread-list cache for both the
//! synchronous and the streaming path. The streaming path runs a detached
//! pump task that forwards fragments to the caller and finalizes the turn
//! exactly once after the provider stream ends, whether or not the caller
//! is still connected.

pub mod metrics;
pub mod service;
pub mod stream;

pub use metrics::{MetricsSnapshot, TurnMetrics};
pub use service::{ChatService, TurnReceipt, TurnRequest};
pub use stream::{TurnEvent, TurnPhase, TurnStream};
