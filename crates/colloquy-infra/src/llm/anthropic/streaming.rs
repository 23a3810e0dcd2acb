//! SSE stream state machine for the Anthropic Messages API.
//!
//! Implements the streaming protocol described in the Anthropic docs:
//! 1. `message_start` -- Message object with initial (input) usage
//! 2. Per block: `content_block_start` -> N x `content_block_delta` -> `content_block_stop`
//! 3. `message_delta` -- stop_reason and cumulative output usage
//! 4. `message_stop` -- final event
//! 5. `ping` events may appear anywhere (keepalive)
//! 6. `error` events may appear mid-stream
//!
//! Anthropic-specific SSE events are mapped to the provider-agnostic
//! [`StreamEvent`] enum: text deltas as they arrive, then exactly one
//! `Usage` (input tokens from `message_start`, output tokens from
//! `message_delta`) and one `Done` when the message stops.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use colloquy_core::llm::provider::GenerationStream;
use colloquy_types::llm::{LlmError, StreamEvent, Usage};

use super::client::API_VERSION;
use super::types::{
    AnthropicDelta, AnthropicRequest, ContentBlockDeltaPayload, ErrorPayload,
    MessageDeltaPayload, MessageStartPayload,
};

/// Create a streaming SSE connection to the Anthropic Messages API.
///
/// The request is sent lazily when the returned stream is first polled.
/// HTTP-level failures surface as a single `Err` item; mid-stream `error`
/// events end the stream with an `Err` after any deltas already yielded.
pub fn create_anthropic_stream(
    client: reqwest::Client,
    url: String,
    body: AnthropicRequest,
    api_key: SecretString,
) -> GenerationStream {
    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                529 => LlmError::Overloaded(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            })?;
        } else {
            yield StreamEvent::Connected;

            let mut usage = Usage::default();
            let mut events = response.bytes_stream().eventsource();

            while let Some(event) = events.next().await {
                let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;

                match event.event.as_str() {
                    "message_start" => {
                        let payload: MessageStartPayload = serde_json::from_str(&event.data)
                            .map_err(|e| LlmError::Deserialization(format!("message_start: {e}")))?;
                        if let Some(start_usage) = payload.message.usage {
                            usage.input_tokens = start_usage.input_tokens;
                        }
                    }
                    "content_block_delta" => {
                        let payload: ContentBlockDeltaPayload = serde_json::from_str(&event.data)
                            .map_err(|e| {
                                LlmError::Deserialization(format!("content_block_delta: {e}"))
                            })?;
                        if let AnthropicDelta::TextDelta { text } = payload.delta {
                            yield StreamEvent::TextDelta { text };
                        }
                    }
                    "message_delta" => {
                        let payload: MessageDeltaPayload = serde_json::from_str(&event.data)
                            .map_err(|e| LlmError::Deserialization(format!("message_delta: {e}")))?;
                        usage.output_tokens = payload.usage.output_tokens;
                        if payload.usage.input_tokens > 0 {
                            usage.input_tokens = payload.usage.input_tokens;
                        }
                    }
                    "message_stop" => {
                        yield StreamEvent::Usage(usage);
                        yield StreamEvent::Done;
                        break;
                    }
                    "error" => {
                        let payload: ErrorPayload = serde_json::from_str(&event.data)
                            .map_err(|e| LlmError::Deserialization(format!("error event: {e}")))?;
                        Err(LlmError::Provider {
                            message: format!("{}: {}", payload.error.error_type, payload.error.message),
                        })?;
                    }
                    // ping keepalives and block start/stop markers carry no text
                    _ => {}
                }
            }
        }
    })
}
