//! Service statistics endpoint.
//!
//! GET /api/v1/stats - Aggregate counts plus turn counters (completed,
//! failed, accounting anomalies). Uses COUNT(*)/SUM SQL queries directly
//! on the database pool.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use sqlx::Row;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/stats - Aggregate service statistics.
pub async fn get_stats(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let row = sqlx::query(
        r#"SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM chat_threads) AS total_threads,
            (SELECT COUNT(*) FROM chat_turns) AS total_turns,
            (SELECT COALESCE(SUM(tokens_used), 0) FROM usage_events) AS total_tokens"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query stats: {e}")))?;

    let total_users: i64 = row.try_get("total_users").unwrap_or(0);
    let total_threads: i64 = row.try_get("total_threads").unwrap_or(0);
    let total_turns: i64 = row.try_get("total_turns").unwrap_or(0);
    let total_tokens: i64 = row.try_get("total_tokens").unwrap_or(0);

    let metrics = state.chat_service.metrics().snapshot();

    let elapsed = start.elapsed().as_millis() as u64;

    let data = serde_json::json!({
        "total_users": total_users,
        "total_threads": total_threads,
        "total_turns": total_turns,
        "total_tokens": total_tokens,
        "turns_completed": metrics.turns_completed,
        "turns_failed": metrics.turns_failed,
        "accounting_anomalies": metrics.accounting_anomalies,
    });

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/stats");

    Ok(Json(resp))
}
