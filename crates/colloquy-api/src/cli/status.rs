//! Service status CLI command.

use anyhow::Result;
use console::style;
use sqlx::Row;

use crate::state::AppState;

/// Show aggregate counts for the local service database.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let row = sqlx::query(
        r#"SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM chat_threads) AS total_threads,
            (SELECT COUNT(*) FROM chat_turns) AS total_turns,
            (SELECT COALESCE(SUM(tokens_used), 0) FROM usage_events) AS total_tokens"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await?;

    let total_users: i64 = row.try_get("total_users").unwrap_or(0);
    let total_threads: i64 = row.try_get("total_threads").unwrap_or(0);
    let total_turns: i64 = row.try_get("total_turns").unwrap_or(0);
    let total_tokens: i64 = row.try_get("total_tokens").unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "total_users": total_users,
                "total_threads": total_threads,
                "total_turns": total_turns,
                "total_tokens": total_tokens,
            })
        );
        return Ok(());
    }

    println!();
    println!("  {} Colloquy status", style("⚡").bold());
    println!();
    println!("  Users:   {}", style(total_users).bold());
    println!("  Threads: {}", style(total_threads).bold());
    println!("  Turns:   {}", style(total_turns).bold());
    println!("  Tokens:  {}", style(total_tokens).bold());
    println!();

    Ok(())
}
