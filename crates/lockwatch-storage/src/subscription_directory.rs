// Database-backed SubscriptionDirectory implementation
//
// The lock_user_mapping table lives next to the event log, but a failed
// lookup is an upstream failure for the scanner, not an event-store one.

use async_trait::async_trait;
use lockwatch_core::{traits::SubscriptionDirectory, DispatchTarget, Error, Result};

use crate::repositories::Database;

#[derive(Clone)]
pub struct DbSubscriptionDirectory {
    db: Database,
}

impl DbSubscriptionDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionDirectory for DbSubscriptionDirectory {
    async fn subscribers(&self, lock_ids: &[String]) -> Result<Vec<DispatchTarget>> {
        if lock_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .db
            .list_subscriptions(lock_ids)
            .await
            .map_err(|e| {
                tracing::debug!(locks = lock_ids.len(), error = %e, "Subscription lookup failed");
                Error::upstream(format!("lock_user_mapping query failed: {e}"))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
