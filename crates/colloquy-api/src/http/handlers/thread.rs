//! Thread endpoints.
//!
//! - GET /api/v1/chat/threads            - List the caller's threads
//! - GET /api/v1/chat/threads/{id}       - Full ordered history
//! - PUT /api/v1/chat/threads/{id}/title - Rename a thread

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use colloquy_types::chat::{ChatTurn, ThreadSummary};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for thread renames.
#[derive(Debug, Deserialize)]
pub struct RenameThreadRequest {
    pub title: String,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid
/// format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// GET /api/v1/chat/threads - List the caller's thread summaries
/// (read-through cached).
pub async fn list_threads(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<ThreadSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let summaries = state.chat_service.list_threads(&user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(summaries, request_id, elapsed)
        .with_link("self", "/api/v1/chat/threads");

    Ok(Json(resp))
}

/// GET /api/v1/chat/threads/{id} - A thread's full message history,
/// ownership-checked.
pub async fn get_thread_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(thread_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChatTurn>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let thread_id = parse_uuid(&thread_id)?;
    let turns = state
        .chat_service
        .thread_history(&user.id, &thread_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let self_link = format!("/api/v1/chat/threads/{thread_id}");
    let resp = ApiResponse::success(turns, request_id, elapsed).with_link("self", &self_link);

    Ok(Json(resp))
}

/// PUT /api/v1/chat/threads/{id}/title - Rename a thread,
/// ownership-checked.
pub async fn rename_thread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(thread_id): Path<String>,
    Json(body): Json<RenameThreadRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let thread_id = parse_uuid(&thread_id)?;
    state
        .chat_service
        .rename_thread(&user.id, &thread_id, &body.title)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({
        "thread_id": thread_id.to_string(),
        "title": body.title,
    });
    let self_link = format!("/api/v1/chat/threads/{thread_id}");
    let resp = ApiResponse::success(data, request_id, elapsed).with_link("thread", &self_link);

    Ok(Json(resp))
}
