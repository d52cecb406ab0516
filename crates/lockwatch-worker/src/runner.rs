// Dispatch run: scan for stale locks, then notify every subscriber

use chrono::{DateTime, Utc};
use lockwatch_core::{
    CancellationToken, DispatchConfig, DispatchSummary, Dispatcher, Result, StaleScanner,
};
use serde::Serialize;

/// What one run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub campaign_name: String,
    pub cutoff: DateTime<Utc>,
    pub stale_count: usize,
    pub target_count: usize,
    pub dry_run: bool,
    pub summary: DispatchSummary,
}

pub struct DispatchRunner {
    scanner: StaleScanner,
    dispatcher: Dispatcher,
    config: DispatchConfig,
}

impl DispatchRunner {
    /// The dispatcher picks up the template and concurrency from `config`
    pub fn new(scanner: StaleScanner, dispatcher: Dispatcher, config: DispatchConfig) -> Self {
        let dispatcher = dispatcher
            .with_template(config.template.clone())
            .with_concurrency(config.concurrency);
        Self {
            scanner,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Scan failures (and cancellation during the scan) are errors; send
    /// failures only show up in the summary
    pub async fn run(&self, dry_run: bool, cancel: &CancellationToken) -> Result<DispatchReport> {
        let campaign = &self.config.campaign_name;
        let outcome = self
            .scanner
            .scan(self.config.stale_threshold()?, cancel)
            .await?;

        let summary = if dry_run {
            for target in &outcome.targets {
                tracing::info!(
                    campaign = %campaign,
                    user_id = %target.user_id,
                    lock_id = %target.lock_id,
                    "Dry run: would notify"
                );
            }
            DispatchSummary::default()
        } else if outcome.targets.is_empty() {
            tracing::info!(campaign = %campaign, "No users to notify");
            DispatchSummary::default()
        } else {
            self.dispatcher
                .dispatch(campaign, &outcome.targets, cancel)
                .await
        };

        Ok(DispatchReport {
            campaign_name: campaign.clone(),
            cutoff: outcome.cutoff,
            stale_count: outcome.stale.len(),
            target_count: outcome.targets.len(),
            dry_run,
            summary,
        })
    }
}
