//! Quota status endpoint.
//!
//! GET /api/v1/chat/usage - The caller's remaining units, tier allotment,
//! reset date, and month-to-date recorded spend.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use colloquy_types::usage::QuotaStatus;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/chat/usage - Current quota standing.
pub async fn get_usage(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<QuotaStatus>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let status = state.chat_service.quota_status(&user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(status, request_id, elapsed)
        .with_link("self", "/api/v1/chat/usage");

    Ok(Json(resp))
}
