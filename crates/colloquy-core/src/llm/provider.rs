//! LlmProvider trait definition.
//!
//! Uses RPITIT for `complete` and `Pin<Box<dyn Stream>>` for `stream`
//! (streams need a concrete type to cross the orchestrator's spawned pump
//! task).

use std::pin::Pin;

use futures_util::Stream;

use colloquy_types::llm::{Generation, GenerationRequest, LlmError, StreamEvent};

/// A boxed stream of generation events.
pub type GenerationStream =
    Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for hosted-model generation backends.
///
/// Implementations live in colloquy-infra (e.g., `AnthropicProvider`).
/// Both entry points reject an empty prompt with
/// [`LlmError::InvalidRequest`] before any network call.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a generation request and receive the whole answer, with its
    /// final token count.
    fn complete(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<Generation, LlmError>> + Send;

    /// Begin a streaming generation. The returned stream is lazy, finite,
    /// and non-restartable: text fragments as they become available,
    /// then a final `Usage` and `Done` -- emitted exactly once however far
    /// the consumer reads.
    fn stream(&self, request: GenerationRequest) -> GenerationStream;
}
