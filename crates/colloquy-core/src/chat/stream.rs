//! Streaming turn events and the per-turn state machine.

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Lifecycle phases of a single chat turn.
///
/// `Failed` is reachable from any earlier phase; `Done` and `Failed` are
/// terminal. Transitions are recorded as structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Init,
    Admitted,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Init => write!(f, "init"),
            TurnPhase::Admitted => write!(f, "admitted"),
            TurnPhase::Streaming => write!(f, "streaming"),
            TurnPhase::Finalizing => write!(f, "finalizing"),
            TurnPhase::Done => write!(f, "done"),
            TurnPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Events delivered to the caller during a streaming turn.
///
/// Fragments arrive in order; the stream ends with exactly one terminal
/// event, either `Completed` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// One incremental piece of the answer.
    Fragment { text: String },
    /// The turn finished and was finalized.
    Completed {
        thread_id: Uuid,
        tokens_used: u32,
        model: String,
    },
    /// The turn failed after streaming began.
    Error { message: String },
}

/// Handle returned to the caller of a streaming turn.
///
/// The thread id is known before the first fragment (threads are resolved
/// or created at admission); the receiver yields fragments and one
/// terminal event, then closes.
pub struct TurnStream {
    pub thread_id: Uuid,
    pub events: mpsc::Receiver<TurnEvent>,
}
