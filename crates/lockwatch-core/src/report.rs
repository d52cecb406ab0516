// Reporting types
//
// The event store returns raw aggregates (CampaignCounts); rates are derived
// here so every store backend reports identical numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::event::{EventType, NotificationEvent};

/// Raw per-campaign aggregate over `sent` rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignCounts {
    pub campaign_name: String,
    pub sent_count: i64,
    pub clicked_count: i64,
    pub unique_users_sent: i64,
    pub unique_users_clicked: i64,
    pub first_sent_at: DateTime<Utc>,
    /// `sent_at` of the newest clicked event; no click time is persisted
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
}

/// Campaign statistics as presented to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CampaignStats {
    pub campaign_name: String,
    pub sent_count: i64,
    pub clicked_count: i64,
    pub unique_users_sent: i64,
    pub unique_users_clicked: i64,
    pub first_sent_at: DateTime<Utc>,
    /// Send time of the most recently sent clicked notification
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
    /// clicked / sent, percent, 2 decimals
    pub click_through_rate: f64,
    /// unique clicked users / unique sent users, percent, 2 decimals
    pub user_engagement_rate: f64,
}

impl From<CampaignCounts> for CampaignStats {
    fn from(counts: CampaignCounts) -> Self {
        Self {
            click_through_rate: percentage(counts.clicked_count, counts.sent_count),
            user_engagement_rate: percentage(
                counts.unique_users_clicked,
                counts.unique_users_sent,
            ),
            campaign_name: counts.campaign_name,
            sent_count: counts.sent_count,
            clicked_count: counts.clicked_count,
            unique_users_sent: counts.unique_users_sent,
            unique_users_clicked: counts.unique_users_clicked,
            first_sent_at: counts.first_sent_at,
            last_clicked_at: counts.last_clicked_at,
            last_activity: counts.last_activity,
        }
    }
}

/// One row of a user's notification history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserEngagement {
    pub campaign_name: String,
    pub lock_id: String,
    pub event_type: EventType,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub clicked: bool,
}

impl From<NotificationEvent> for UserEngagement {
    fn from(event: NotificationEvent) -> Self {
        Self {
            campaign_name: event.campaign_name,
            lock_id: event.lock_id,
            event_type: event.event_type,
            sent_at: event.sent_at,
            batch_id: event.batch_id,
            clicked: event.clicked,
        }
    }
}

/// Totals across every campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct OverallPerformance {
    pub total_sent: i64,
    pub total_clicked: i64,
    pub average_ctr: f64,
    pub campaign_count: usize,
}

/// `numerator / denominator * 100` rounded half away from zero to 2 decimals;
/// 0 for an empty denominator
///
/// Computed in integer hundredths so `.xx5` ties round like SQL `ROUND(numeric, 2)`.
pub fn percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    let n = i128::from(numerator);
    let d = i128::from(denominator);
    let half = if n < 0 { -d } else { d };
    let hundredths = (2 * n * 10_000 + half) / (2 * d);
    hundredths as f64 / 100.0
}
