//! LLM request/response types.
//!
//! Provider-agnostic shapes for generation requests, completed generations,
//! streaming events, and token usage. Concrete providers in the infra layer
//! translate these to their wire formats.

use serde::{Deserialize, Serialize};

/// Request to an LLM provider for a generation.
///
/// The prompt is a single assembled string (system preamble plus the
/// conversation transcript); the context assembler owns its construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Concrete provider model id (already resolved from any alias).
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

/// A completed, whole-answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    /// Total tokens consumed (provider-reported input + output, or an
    /// estimate when the provider reported none).
    pub tokens_used: u32,
    pub model: String,
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    /// Combined input + output token count.
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Estimate a token count from text length when the provider reports no
/// usage: roughly four characters per token.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() as f64 / 4.0).ceil() as u32
}

/// Events emitted during a streaming generation.
///
/// The `Usage` and `Done` events together form the completion notification:
/// they fire exactly once per stream, however far the consumer reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Connection established with the provider.
    Connected,

    /// A fragment of generated text.
    TextDelta { text: String },

    /// Final token usage for the generation.
    Usage(Usage),

    /// The stream has completed.
    Done,
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited")]
    RateLimited,

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        let usage = Usage {
            input_tokens: 30,
            output_tokens: 12,
        };
        assert_eq!(usage.total(), 42);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_stream_event_serde_tagged() {
        let event = StreamEvent::TextDelta {
            text: "Hel".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"text_delta\""));
        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            StreamEvent::TextDelta { text } => assert_eq!(text, "Hel"),
            other => panic!("expected TextDelta, got {other:?}"),
        }
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::InvalidRequest("prompt must be non-empty".to_string());
        assert_eq!(err.to_string(), "invalid request: prompt must be non-empty");
    }
}
