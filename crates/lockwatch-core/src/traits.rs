// Core traits for pluggable backends
//
// These traits let the services run against different backends:
// - In-memory implementations for tests and local runs (see `memory`)
// - PostgreSQL for the event store and subscription mapping
// - DynamoDB for the device registry, FCM for push delivery

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::event::{CorrelationKey, NewSentEvent, NotificationEvent};
use crate::push::PushMessage;
use crate::report::CampaignCounts;
use crate::resource::{DispatchTarget, StaleResource};

// ============================================================================
// EventStore - Durable log of notification lifecycle events
// ============================================================================

/// Append/update log of sent notifications with correlation and aggregation
///
/// Implementations must assign `id` and `sent_at` themselves and must make
/// `mark_latest_clicked` a single atomic conditional update.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a `sent`, unclicked event
    async fn record_sent(&self, input: NewSentEvent) -> Result<NotificationEvent>;

    /// Flip `clicked` on the newest outstanding send for `key`
    ///
    /// Returns `None` when nothing matched. Concurrent calls for the same key
    /// never flip more than one row between them.
    async fn mark_latest_clicked(&self, key: &CorrelationKey)
        -> Result<Option<NotificationEvent>>;

    /// Aggregate one campaign's `sent` rows; `None` when the campaign has none
    async fn campaign_counts(&self, campaign_name: &str) -> Result<Option<CampaignCounts>>;

    /// Aggregate every campaign, newest `last_activity` first
    async fn all_campaign_counts(&self) -> Result<Vec<CampaignCounts>>;

    /// Every event for a user, newest `sent_at` first
    async fn user_events(&self, user_id: &str) -> Result<Vec<NotificationEvent>>;
}

// ============================================================================
// DeviceRegistry - External device-state store
// ============================================================================

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Locks whose last battery check is strictly before `cutoff`
    async fn checked_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleResource>>;

    /// Record a battery check for `lock_id` now; returns the stored timestamp
    async fn mark_checked(&self, lock_id: &str) -> Result<DateTime<Utc>>;
}

// ============================================================================
// SubscriptionDirectory - lock → (user, push token) mapping
// ============================================================================

#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    /// Every subscriber of any of `lock_ids`
    async fn subscribers(&self, lock_ids: &[String]) -> Result<Vec<DispatchTarget>>;
}

// ============================================================================
// PushGateway - Opaque send primitive
// ============================================================================

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver one message; returns the gateway's message identifier
    async fn send(&self, message: &PushMessage) -> Result<String>;
}
