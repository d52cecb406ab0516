// Push payload types
//
// PushMessage is gateway-agnostic: title/body for display plus a flat string
// data envelope the mobile app echoes back on confirmation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resource::DispatchTarget;

pub const DEFAULT_TITLE: &str = "🔋 Battery Alert";
pub const DEFAULT_BODY: &str = "Lock {lock_id} battery needs attention!";

/// Message handed to a PushGateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// Title/body template; `{lock_id}` and `{user_id}` are substituted per target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub title: String,
    pub body: String,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

impl NotificationTemplate {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Render the message for one target
    pub fn render(
        &self,
        campaign_name: &str,
        target: &DispatchTarget,
        dispatched_at: DateTime<Utc>,
    ) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("campaign_id".to_string(), campaign_name.to_string());
        data.insert("lock_id".to_string(), target.lock_id.clone());
        data.insert("user_id".to_string(), target.user_id.clone());
        data.insert(
            "timestamp".to_string(),
            dispatched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        PushMessage {
            token: target.push_token.clone(),
            title: substitute(&self.title, target),
            body: substitute(&self.body, target),
            data,
        }
    }
}

fn substitute(template: &str, target: &DispatchTarget) -> String {
    template
        .replace("{lock_id}", &target.lock_id)
        .replace("{user_id}", &target.user_id)
}
