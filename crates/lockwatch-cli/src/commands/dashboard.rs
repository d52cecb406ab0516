// Dashboard: every campaign, per-campaign detail, overall performance

use anyhow::{Context, Result};
use lockwatch_core::{CampaignStats, OverallPerformance, Reporter};
use serde::Serialize;

use super::campaign::print_campaign_detail;
use crate::output::{format_rate, print_field, print_section, print_table_header, print_table_row, OutputFormat};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub campaigns: Vec<CampaignStats>,
    pub overall: OverallPerformance,
}

pub async fn load(reporter: &Reporter) -> Result<Dashboard> {
    let campaigns = reporter
        .all_campaigns()
        .await
        .context("Failed to load campaign statistics")?;
    let overall = Reporter::overall(&campaigns);
    Ok(Dashboard { campaigns, overall })
}

pub async fn run(reporter: &Reporter, output: OutputFormat) -> Result<()> {
    let dashboard = load(reporter).await?;

    if !output.is_text() {
        return output.print_value(&dashboard);
    }

    print_section("Campaign Performance");
    if dashboard.campaigns.is_empty() {
        println!("No campaigns found");
        return Ok(());
    }

    print_table_header(&[
        ("CAMPAIGN", 24),
        ("SENT", 8),
        ("CLICKED", 8),
        ("CTR", 8),
        ("USERS", 8),
        ("ENGAGED", 8),
    ]);
    for c in &dashboard.campaigns {
        let sent = c.sent_count.to_string();
        let clicked = c.clicked_count.to_string();
        let ctr = format_rate(c.click_through_rate);
        let users = c.unique_users_sent.to_string();
        let engaged = format_rate(c.user_engagement_rate);
        print_table_row(&[
            (&c.campaign_name, 24),
            (&sent, 8),
            (&clicked, 8),
            (&ctr, 8),
            (&users, 8),
            (&engaged, 8),
        ]);
    }

    for c in &dashboard.campaigns {
        println!();
        print_campaign_detail(c);
    }

    println!();
    print_section("Overall Performance");
    print_field("Total notifications", &dashboard.overall.total_sent.to_string());
    print_field("Total clicks", &dashboard.overall.total_clicked.to_string());
    print_field("Average CTR", &format_rate(dashboard.overall.average_ctr));
    print_field("Campaigns", &dashboard.overall.campaign_count.to_string());

    Ok(())
}
