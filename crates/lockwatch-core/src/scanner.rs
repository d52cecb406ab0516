// Stale-lock scanner
//
// Finds locks whose last battery check is older than the threshold and
// resolves them to (user, lock, push token) targets.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::error::{Error, Result};
use crate::resource::{DispatchTarget, StaleResource};
use crate::traits::{DeviceRegistry, SubscriptionDirectory};

/// Result of one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Locks checked strictly before this instant are stale
    pub cutoff: DateTime<Utc>,
    pub stale: Vec<StaleResource>,
    pub targets: Vec<DispatchTarget>,
}

/// `now - threshold`, or a configuration error when it falls outside the calendar
pub fn stale_cutoff(now: DateTime<Utc>, threshold: Duration) -> Result<DateTime<Utc>> {
    now.checked_sub_signed(threshold)
        .ok_or_else(|| Error::config(format!("stale threshold {threshold} is out of range")))
}

pub struct StaleScanner {
    registry: Arc<dyn DeviceRegistry>,
    subscriptions: Arc<dyn SubscriptionDirectory>,
}

impl StaleScanner {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        subscriptions: Arc<dyn SubscriptionDirectory>,
    ) -> Self {
        Self {
            registry,
            subscriptions,
        }
    }

    /// Locks whose last check is strictly older than `now - threshold`
    pub async fn find_stale(&self, threshold: Duration) -> Result<(DateTime<Utc>, Vec<StaleResource>)> {
        let cutoff = stale_cutoff(Utc::now(), threshold)?;
        let stale = self.stale_before(cutoff).await?;
        Ok((cutoff, stale))
    }

    async fn stale_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleResource>> {
        let mut stale: Vec<StaleResource> = self
            .registry
            .checked_before(cutoff)
            .await?
            .into_iter()
            .filter(|r| r.last_checked_at < cutoff)
            .collect();
        stale.sort_by(|a, b| a.lock_id.cmp(&b.lock_id));
        stale.dedup_by(|a, b| a.lock_id == b.lock_id);
        Ok(stale)
    }

    /// Subscribers of the given locks; locks without subscribers contribute nothing
    pub async fn resolve_targets(&self, lock_ids: &[String]) -> Result<Vec<DispatchTarget>> {
        let unique: BTreeSet<&String> = lock_ids.iter().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let lock_ids: Vec<String> = unique.into_iter().cloned().collect();
        self.subscriptions.subscribers(&lock_ids).await
    }

    /// find_stale followed by resolve_targets, abandoning either call on cancellation
    pub async fn scan(&self, threshold: Duration, cancel: &CancellationToken) -> Result<ScanOutcome> {
        let cutoff = stale_cutoff(Utc::now(), threshold)?;
        tracing::info!(cutoff = %cutoff, "Scanning for locks with last check before cutoff");

        let stale = run_cancellable(cancel, self.stale_before(cutoff)).await?;
        tracing::info!(count = stale.len(), "Found stale locks");

        if stale.is_empty() {
            return Ok(ScanOutcome {
                cutoff,
                stale,
                targets: Vec::new(),
            });
        }

        let lock_ids: Vec<String> = stale.iter().map(|r| r.lock_id.clone()).collect();
        let targets = run_cancellable(cancel, self.resolve_targets(&lock_ids)).await?;
        tracing::info!(count = targets.len(), "Resolved users to notify");

        Ok(ScanOutcome {
            cutoff,
            stale,
            targets,
        })
    }
}
