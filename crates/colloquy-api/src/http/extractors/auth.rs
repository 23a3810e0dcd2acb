//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and resolved against the `users` table, yielding
//! the caller's identity (user id + membership tier) before any core
//! operation runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use colloquy_types::account::{MembershipTier, UserIdentity};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated caller. Extracting this validates the API key and
/// resolves the user's identity.
pub struct CurrentUser(pub UserIdentity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        let row = sqlx::query("SELECT id, membership_tier FROM users WHERE api_key_hash = ?")
            .bind(&key_hash)
            .fetch_optional(&state.db_pool.reader)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match row {
            Some(row) => {
                let id: String = row.get("id");
                let tier: String = row.get("membership_tier");
                let id = Uuid::parse_str(&id)
                    .map_err(|e| AppError::Internal(format!("Corrupt user id: {e}")))?;
                // Unknown tier strings fall back to the free allotment.
                let tier: MembershipTier = tier.parse().unwrap_or_default();
                Ok(CurrentUser(UserIdentity { id, tier }))
            }
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <key>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Create a user account with the given tier and a fresh API key.
///
/// The balance starts at zero with no reset boundary, so the first
/// admission check applies the tier allotment. Returns the plaintext key
/// (shown to the operator once) and the new user's id.
pub async fn create_user(
    state: &AppState,
    tier: MembershipTier,
) -> anyhow::Result<(String, Uuid)> {
    use aes_gcm::aead::{rand_core::RngCore, OsRng};
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    let plaintext_key = format!(
        "clqy_{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    );

    let key_hash = hash_api_key(&plaintext_key);
    let id = Uuid::now_v7();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, api_key_hash, membership_tier, remaining_units, units_reset_at, created_at)
           VALUES (?, ?, ?, 0, NULL, ?)"#,
    )
    .bind(id.to_string())
    .bind(&key_hash)
    .bind(tier.to_string())
    .bind(&now)
    .execute(&state.db_pool.writer)
    .await?;

    Ok((plaintext_key, id))
}
