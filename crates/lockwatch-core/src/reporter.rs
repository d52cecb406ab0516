// Campaign and user reporting over the event store
//
// Pure reads; nothing here writes.

use std::sync::Arc;

use crate::error::Result;
use crate::report::{percentage, CampaignStats, OverallPerformance, UserEngagement};
use crate::traits::EventStore;

pub struct Reporter {
    store: Arc<dyn EventStore>,
}

impl Reporter {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Statistics for one campaign; `None` when it has no sends
    pub async fn campaign_stats(&self, campaign_name: &str) -> Result<Option<CampaignStats>> {
        let counts = self.store.campaign_counts(campaign_name).await?;
        Ok(counts.map(CampaignStats::from))
    }

    /// Every campaign, most recent activity first
    pub async fn all_campaigns(&self) -> Result<Vec<CampaignStats>> {
        let counts = self.store.all_campaign_counts().await?;
        Ok(counts.into_iter().map(CampaignStats::from).collect())
    }

    /// A user's notification history, newest first
    pub async fn user_history(&self, user_id: &str) -> Result<Vec<UserEngagement>> {
        let events = self.store.user_events(user_id).await?;
        Ok(events.into_iter().map(UserEngagement::from).collect())
    }

    /// Totals across the given campaigns
    pub fn overall(campaigns: &[CampaignStats]) -> OverallPerformance {
        let total_sent: i64 = campaigns.iter().map(|c| c.sent_count).sum();
        let total_clicked: i64 = campaigns.iter().map(|c| c.clicked_count).sum();
        OverallPerformance {
            total_sent,
            total_clicked,
            average_ctr: percentage(total_clicked, total_sent),
            campaign_count: campaigns.len(),
        }
    }
}
