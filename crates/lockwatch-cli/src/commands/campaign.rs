// Single campaign statistics

use anyhow::{anyhow, Context, Result};
use lockwatch_core::{CampaignStats, Reporter};

use super::{format_optional_time, format_time};
use crate::output::{format_rate, print_field, print_section, OutputFormat};

pub(crate) fn print_campaign_detail(c: &CampaignStats) {
    print_section(&format!("Campaign: {}", c.campaign_name));
    print_field("Notifications sent", &c.sent_count.to_string());
    print_field("Clicks", &c.clicked_count.to_string());
    print_field("Click-through rate", &format_rate(c.click_through_rate));
    print_field("Users notified", &c.unique_users_sent.to_string());
    print_field("Users engaged", &c.unique_users_clicked.to_string());
    print_field("User engagement rate", &format_rate(c.user_engagement_rate));
    print_field("First sent", &format_time(&c.first_sent_at));
    print_field("Last clicked", &format_optional_time(&c.last_clicked_at));
    print_field("Last activity", &format_time(&c.last_activity));
}

pub async fn run(reporter: &Reporter, output: OutputFormat, campaign_name: &str) -> Result<()> {
    let stats = reporter
        .campaign_stats(campaign_name)
        .await
        .context("Failed to load campaign statistics")?
        .ok_or_else(|| anyhow!("Campaign '{}' not found", campaign_name))?;

    if output.is_text() {
        print_campaign_detail(&stats);
        Ok(())
    } else {
        output.print_value(&stats)
    }
}
