// Per-user notification history

use anyhow::{Context, Result};
use lockwatch_core::Reporter;

use super::format_time;
use crate::output::{print_table_header, print_table_row, OutputFormat};

pub async fn run(reporter: &Reporter, output: OutputFormat, user_id: &str) -> Result<()> {
    let history = reporter
        .user_history(user_id)
        .await
        .context("Failed to load user engagement")?;

    if !output.is_text() {
        return output.print_value(&serde_json::json!({
            "user_id": user_id,
            "data": history,
            "total": history.len(),
        }));
    }

    if history.is_empty() {
        println!("No notifications found for user {}", user_id);
        return Ok(());
    }

    print_table_header(&[
        ("CAMPAIGN", 24),
        ("LOCK", 16),
        ("SENT AT", 19),
        ("CLICKED", 7),
        ("BATCH", 30),
    ]);
    for event in &history {
        let sent_at = format_time(&event.sent_at);
        let clicked = if event.clicked { "yes" } else { "no" };
        let batch = event.batch_id.as_deref().unwrap_or("-");
        print_table_row(&[
            (&event.campaign_name, 24),
            (&event.lock_id, 16),
            (&sent_at, 19),
            (clicked, 7),
            (batch, 30),
        ]);
    }

    Ok(())
}
