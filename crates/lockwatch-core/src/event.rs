// Notification event domain types
//
// A NotificationEvent is created once at send time and later carries the
// `clicked` flag; a click never produces a second record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Lifecycle marker stored in the `event_type` column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Sent,
    Clicked,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Sent => "sent",
            EventType::Clicked => "clicked",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "clicked" => EventType::Clicked,
            _ => EventType::Sent,
        }
    }
}

/// One recorded notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NotificationEvent {
    pub id: Uuid,
    pub user_id: String,
    pub lock_id: String,
    pub campaign_name: String,
    pub event_type: EventType,
    /// Assigned by the event store clock, never by the caller
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub clicked: bool,
}

/// Input for recording a successful send. Ids and timestamps are store-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSentEvent {
    pub user_id: String,
    pub lock_id: String,
    pub campaign_name: String,
    pub batch_id: Option<String>,
}

/// Key a confirmation is correlated on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub campaign_name: String,
    pub user_id: String,
    pub lock_id: String,
}

impl CorrelationKey {
    pub fn new(
        campaign_name: impl Into<String>,
        user_id: impl Into<String>,
        lock_id: impl Into<String>,
    ) -> Self {
        Self {
            campaign_name: campaign_name.into(),
            user_id: user_id.into(),
            lock_id: lock_id.into(),
        }
    }

    /// Whether `event` is an outstanding (sent, unclicked) notification for this key
    pub fn matches_unclicked(&self, event: &NotificationEvent) -> bool {
        event.event_type == EventType::Sent
            && !event.clicked
            && event.user_id == self.user_id
            && event.lock_id == self.lock_id
            && event.campaign_name == self.campaign_name
    }
}
