//! User management CLI commands: create, list.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use sqlx::Row;

use colloquy_types::account::MembershipTier;

use crate::http::extractors::auth;
use crate::state::AppState;

/// Create a user account with the given tier and print its API key.
///
/// # Examples
///
/// ```bash
/// clqy create user --tier premium
/// ```
pub async fn create_user(state: &AppState, tier: &str, json: bool) -> Result<()> {
    let tier: MembershipTier = tier
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let (api_key, user_id) = auth::create_user(state, tier).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "user_id": user_id.to_string(),
                "membership_tier": tier.to_string(),
                "api_key": api_key,
            })
        );
    } else {
        println!();
        println!(
            "  {} User {} created ({})",
            style("✓").green().bold(),
            style(user_id).bold(),
            style(tier).cyan()
        );
        println!();
        println!(
            "  {} API key (save this -- it won't be shown again):",
            style("🔑").bold()
        );
        println!();
        println!("  {}", style(&api_key).yellow().bold());
        println!();
    }

    Ok(())
}

/// List user accounts with their tier and quota standing.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let rows = sqlx::query(
        "SELECT id, membership_tier, remaining_units, units_reset_at, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(&state.db_pool.reader)
    .await?;

    if json {
        let users: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "id": row.get::<String, _>("id"),
                    "membership_tier": row.get::<String, _>("membership_tier"),
                    "remaining_units": row.get::<i64, _>("remaining_units"),
                    "units_reset_at": row.get::<Option<String>, _>("units_reset_at"),
                    "created_at": row.get::<String, _>("created_at"),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!();
        println!(
            "  {} No users yet. Add one with: {}",
            style("i").blue().bold(),
            style("clqy create user --tier free").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("User").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Remaining").fg(Color::White),
        Cell::new("Resets").fg(Color::White),
    ]);

    for row in &rows {
        let id: String = row.get("id");
        let tier: String = row.get("membership_tier");
        let remaining: i64 = row.get("remaining_units");
        let reset_at: Option<String> = row.get("units_reset_at");

        table.add_row(vec![
            Cell::new(id).fg(Color::Cyan),
            Cell::new(tier),
            Cell::new(remaining.to_string()),
            Cell::new(reset_at.unwrap_or_else(|| "(on next request)".to_string()))
                .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} user{}",
        style(rows.len()).bold(),
        if rows.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
