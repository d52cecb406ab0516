// Device-side inputs to a dispatch run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lock whose last battery check is older than the staleness cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleResource {
    pub lock_id: String,
    pub last_checked_at: DateTime<Utc>,
}

/// One (user, lock) pair to notify, resolved from the subscription mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchTarget {
    pub user_id: String,
    pub lock_id: String,
    /// Device registration token understood by the push gateway
    pub push_token: String,
}

impl DispatchTarget {
    pub fn new(
        user_id: impl Into<String>,
        lock_id: impl Into<String>,
        push_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            lock_id: lock_id.into(),
            push_token: push_token.into(),
        }
    }
}
