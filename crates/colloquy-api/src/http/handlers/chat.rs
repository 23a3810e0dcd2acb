//! Chat endpoints: synchronous turns and SSE streaming turns.
//!
//! - POST /api/v1/chat        -- whole-answer turn
//! - POST /api/v1/chat/stream -- Server-Sent Events streaming turn
//!
//! SSE event types:
//! - `thread` — initial event with `{ "thread_id": "..." }`
//! - `fragment` — incremental text: `{ "text": "..." }`
//! - `completed` — turn finalized: `{ "thread_id", "tokens_used", "model" }`
//! - `error` — error occurred after streaming began: `{ "message": "..." }`

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use tokio_stream::Stream;
use uuid::Uuid;

use colloquy_core::chat::{TurnEvent, TurnReceipt, TurnRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for both chat endpoints.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message to send.
    pub message: String,
    /// Existing thread to continue; if absent, a new thread is created.
    pub thread_id: Option<Uuid>,
    /// Model alias ("opus", "sonnet", "haiku"); defaults to the catalog
    /// default when absent or unrecognized.
    pub model: Option<String>,
}

impl From<ChatRequest> for TurnRequest {
    fn from(body: ChatRequest) -> Self {
        TurnRequest {
            message: body.message,
            thread_id: body.thread_id,
            model: body.model,
        }
    }
}

/// POST /api/v1/chat — synchronous whole-answer turn.
pub async fn send_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<TurnReceipt>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let receipt = state.chat_service.send_turn(user, body.into()).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let thread_link = format!("/api/v1/chat/threads/{}", receipt.thread_id);
    let resp = ApiResponse::success(receipt, request_id, elapsed)
        .with_link("self", "/api/v1/chat")
        .with_link("thread", &thread_link);

    Ok(Json(resp))
}

/// POST /api/v1/chat/stream — SSE streaming turn.
///
/// Admission failures (invalid input, quota exhaustion, foreign thread)
/// surface as HTTP error responses before the stream opens. Once streaming
/// has begun, failures arrive as a terminal `error` event on the same
/// channel, followed by clean closure. Client disconnects do not stop the
/// underlying generation or its finalization.
pub async fn stream_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let turn_stream = state
        .chat_service
        .clone()
        .stream_turn(user, body.into())
        .await?;

    let thread_id = turn_stream.thread_id;
    let mut events = turn_stream.events;

    let sse_stream = async_stream::stream! {
        let thread_json = serde_json::json!({ "thread_id": thread_id.to_string() });
        yield Ok::<_, Infallible>(Event::default().event("thread").data(thread_json.to_string()));

        while let Some(event) = events.recv().await {
            match event {
                TurnEvent::Fragment { text } => {
                    let data = serde_json::json!({ "text": text });
                    yield Ok(Event::default().event("fragment").data(data.to_string()));
                }
                TurnEvent::Completed {
                    thread_id,
                    tokens_used,
                    model,
                } => {
                    let data = serde_json::json!({
                        "thread_id": thread_id.to_string(),
                        "tokens_used": tokens_used,
                        "model": model,
                    });
                    yield Ok(Event::default().event("completed").data(data.to_string()));
                }
                TurnEvent::Error { message } => {
                    let data = serde_json::json!({ "message": message });
                    yield Ok(Event::default().event("error").data(data.to_string()));
                }
            }
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
