// Database models (internal, may differ from core domain types)

use chrono::{DateTime, Utc};
use lockwatch_core::{CampaignCounts, DispatchTarget, EventType, NotificationEvent};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Campaign analytics
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct NotificationEventRow {
    pub id: Uuid,
    pub user_id: String,
    pub lock_id: String,
    pub campaign_name: String,
    pub event_type: String,
    pub sent_at: DateTime<Utc>,
    pub batch_id: Option<String>,
    pub clicked: bool,
}

#[derive(Debug, Clone)]
pub struct CreateSentEventRow {
    pub user_id: String,
    pub lock_id: String,
    pub campaign_name: String,
    pub batch_id: Option<String>,
}

impl From<NotificationEventRow> for NotificationEvent {
    fn from(row: NotificationEventRow) -> Self {
        NotificationEvent {
            id: row.id,
            user_id: row.user_id,
            lock_id: row.lock_id,
            campaign_name: row.campaign_name,
            event_type: EventType::from(row.event_type.as_str()),
            sent_at: row.sent_at,
            batch_id: row.batch_id,
            clicked: row.clicked,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CampaignCountsRow {
    pub campaign_name: String,
    pub sent_count: i64,
    pub clicked_count: i64,
    pub unique_users_sent: i64,
    pub unique_users_clicked: i64,
    pub first_sent_at: DateTime<Utc>,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
}

impl From<CampaignCountsRow> for CampaignCounts {
    fn from(row: CampaignCountsRow) -> Self {
        CampaignCounts {
            campaign_name: row.campaign_name,
            sent_count: row.sent_count,
            clicked_count: row.clicked_count,
            unique_users_sent: row.unique_users_sent,
            unique_users_clicked: row.unique_users_clicked,
            first_sent_at: row.first_sent_at,
            last_clicked_at: row.last_clicked_at,
            last_activity: row.last_activity,
        }
    }
}

// ============================================
// Lock subscriptions
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub user_id: String,
    pub lock_id: String,
    pub fcm_id: String,
}

impl From<SubscriptionRow> for DispatchTarget {
    fn from(row: SubscriptionRow) -> Self {
        DispatchTarget {
            user_id: row.user_id,
            lock_id: row.lock_id,
            push_token: row.fcm_id,
        }
    }
}
