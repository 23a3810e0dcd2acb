//! AnthropicProvider -- concrete [`LlmProvider`] implementation for
//! Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with
//! proper authentication headers. Supports both non-streaming (`complete`)
//! and streaming (`stream`) modes.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use colloquy_core::llm::provider::{GenerationStream, LlmProvider};
use colloquy_types::llm::{estimate_tokens, Generation, GenerationRequest, LlmError};

use super::streaming::create_anthropic_stream;
use super::types::{
    AnthropicContentBlock, AnthropicMessage, AnthropicNonStreamResponse, AnthropicRequest,
};

/// The Anthropic API version header value.
pub(super) const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude LLM provider.
///
/// Implements [`LlmProvider`] for the Anthropic Messages API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. It never appears in Debug output,
/// Display output, or tracing logs.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`GenerationRequest`] into an [`AnthropicRequest`].
    ///
    /// The assembled prompt travels as a single user message; the system
    /// preamble is already part of the prompt.
    fn to_anthropic_request(request: &GenerationRequest, stream: bool) -> AnthropicRequest {
        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            stream,
            temperature: request.temperature,
        }
    }
}

// AnthropicProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state.

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<Generation, LlmError> {
        if request.prompt.is_empty() {
            return Err(LlmError::InvalidRequest(
                "prompt must be a non-empty string".to_string(),
            ));
        }

        info!(model = %request.model, "generating response");
        let body = Self::to_anthropic_request(request, false);
        let url = self.url("/v1/messages");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
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
            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                529 => LlmError::Overloaded(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let anthropic_resp: AnthropicNonStreamResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let text = anthropic_resp
            .content
            .iter()
            .map(|block| match block {
                AnthropicContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("");

        let reported = anthropic_resp.usage.input_tokens + anthropic_resp.usage.output_tokens;
        let tokens_used = if reported > 0 {
            reported
        } else {
            estimate_tokens(&text)
        };
        info!(
            model = %anthropic_resp.model,
            chars = text.len(),
            tokens = tokens_used,
            "response received"
        );

        Ok(Generation {
            text,
            tokens_used,
            model: anthropic_resp.model,
        })
    }

    fn stream(&self, request: GenerationRequest) -> GenerationStream {
        if request.prompt.is_empty() {
            return Box::pin(futures_util::stream::once(async {
                Err(LlmError::InvalidRequest(
                    "prompt must be a non-empty string".to_string(),
                ))
            }));
        }

        info!(model = %request.model, "starting streaming generation");
        let body = Self::to_anthropic_request(&request, true);
        let url = self.url("/v1/messages");

        create_anthropic_stream(self.client.clone(), url, body, self.api_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn make_provider() -> AnthropicProvider {
        AnthropicProvider::new(SecretString::from("test-key-not-real"))
    }

    fn make_request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            prompt: prompt.to_string(),
            max_tokens: 1024,
            temperature: Some(0.7),
            stream: false,
        }
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(make_provider().name(), "anthropic");
    }

    #[test]
    fn test_base_url_override() {
        let provider = make_provider().with_base_url("http://localhost:8080".to_string());
        assert_eq!(
            provider.url("/v1/messages"),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn test_to_anthropic_request() {
        let request = make_request("System.\n\nUser: Hello\n\nAssistant:");
        let anthropic_req = AnthropicProvider::to_anthropic_request(&request, true);
        assert_eq!(anthropic_req.model, "claude-sonnet-4-20250514");
        assert!(anthropic_req.stream);
        assert_eq!(anthropic_req.messages.len(), 1);
        assert_eq!(anthropic_req.messages[0].role, "user");
        assert_eq!(
            anthropic_req.messages[0].content,
            "System.\n\nUser: Hello\n\nAssistant:"
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_prompt() {
        let provider = make_provider();
        let result = provider.complete(&make_request("")).await;
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stream_rejects_empty_prompt() {
        let provider = make_provider();
        let mut stream = provider.stream(make_request(""));
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(LlmError::InvalidRequest(_))));
        assert!(stream.next().await.is_none());
    }
}
