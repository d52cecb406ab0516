// Notification dispatcher
//
// Sends one push per target and records each accepted send. Targets are
// independent: a failure is logged and counted, never propagated.

use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::error::Error;
use crate::event::NewSentEvent;
use crate::push::NotificationTemplate;
use crate::resource::DispatchTarget;
use crate::traits::{EventStore, PushGateway};

/// Aggregate result of a dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Sent and recorded
    pub success_count: usize,
    /// Gateway failures plus sends that could not be recorded
    pub failure_count: usize,
    /// Delivered by the gateway but missing from the event store
    pub unrecorded_count: usize,
    /// Not attempted, or abandoned mid-call, because the run was cancelled
    pub skipped_count: usize,
    pub cancelled: bool,
}

impl DispatchSummary {
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetOutcome {
    Sent,
    SendFailed,
    Unrecorded,
    Skipped,
}

pub struct Dispatcher {
    gateway: Arc<dyn PushGateway>,
    store: Arc<dyn EventStore>,
    template: NotificationTemplate,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn PushGateway>, store: Arc<dyn EventStore>) -> Self {
        Self {
            gateway,
            store,
            template: NotificationTemplate::default(),
            concurrency: 1,
        }
    }

    pub fn with_template(mut self, template: NotificationTemplate) -> Self {
        self.template = template;
        self
    }

    /// Maximum in-flight targets; 1 keeps the run strictly sequential
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Notify every target for `campaign_name`
    pub async fn dispatch(
        &self,
        campaign_name: &str,
        targets: &[DispatchTarget],
        cancel: &CancellationToken,
    ) -> DispatchSummary {
        let outcomes: Vec<TargetOutcome> = futures::stream::iter(
            targets
                .iter()
                .map(|target| self.dispatch_one(campaign_name, target, cancel)),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut summary = DispatchSummary::default();
        for outcome in outcomes {
            match outcome {
                TargetOutcome::Sent => summary.success_count += 1,
                TargetOutcome::SendFailed => summary.failure_count += 1,
                TargetOutcome::Unrecorded => {
                    summary.failure_count += 1;
                    summary.unrecorded_count += 1;
                }
                TargetOutcome::Skipped => summary.skipped_count += 1,
            }
        }
        summary.cancelled = summary.skipped_count > 0;

        tracing::info!(
            campaign = %campaign_name,
            sent = summary.success_count,
            failed = summary.failure_count,
            unrecorded = summary.unrecorded_count,
            skipped = summary.skipped_count,
            "Dispatch finished"
        );
        summary
    }

    async fn dispatch_one(
        &self,
        campaign_name: &str,
        target: &DispatchTarget,
        cancel: &CancellationToken,
    ) -> TargetOutcome {
        if cancel.is_cancelled() {
            return TargetOutcome::Skipped;
        }

        let message = self.template.render(campaign_name, target, Utc::now());
        let batch_id = match run_cancellable(cancel, self.gateway.send(&message)).await {
            Ok(batch_id) => batch_id,
            Err(Error::Cancelled) => {
                tracing::info!(
                    user_id = %target.user_id,
                    lock_id = %target.lock_id,
                    "Send abandoned, dispatch cancelled"
                );
                return TargetOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!(
                    user_id = %target.user_id,
                    lock_id = %target.lock_id,
                    error = %e,
                    "Failed to send notification"
                );
                return TargetOutcome::SendFailed;
            }
        };

        // The gateway accepted the message: record it even if cancellation fires now
        let input = NewSentEvent {
            user_id: target.user_id.clone(),
            lock_id: target.lock_id.clone(),
            campaign_name: campaign_name.to_string(),
            batch_id: Some(batch_id.clone()),
        };
        match self.store.record_sent(input).await {
            Ok(event) => {
                tracing::info!(
                    user_id = %target.user_id,
                    lock_id = %target.lock_id,
                    batch_id = %batch_id,
                    event_id = %event.id,
                    "Sent notification"
                );
                TargetOutcome::Sent
            }
            Err(e) => {
                tracing::error!(
                    user_id = %target.user_id,
                    lock_id = %target.lock_id,
                    batch_id = %batch_id,
                    error = %e,
                    "Notification delivered but not recorded; later clicks cannot be correlated"
                );
                TargetOutcome::Unrecorded
            }
        }
    }
}
