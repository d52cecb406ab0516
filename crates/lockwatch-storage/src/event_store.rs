// Database-backed EventStore implementation
//
// Thin adapter over `Database`; every database error surfaces as
// `Error::StoreUnavailable` so callers never see sqlx types.

use async_trait::async_trait;
use lockwatch_core::{
    traits::EventStore, CampaignCounts, CorrelationKey, Error, NewSentEvent, NotificationEvent,
    Result,
};

use crate::models::CreateSentEventRow;
use crate::repositories::Database;

fn store_error(operation: &'static str, error: anyhow::Error) -> Error {
    tracing::debug!(operation, error = %error, "Event store query failed");
    Error::store(error.to_string())
}

#[derive(Clone)]
pub struct DbEventStore {
    db: Database,
}

impl DbEventStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for DbEventStore {
    async fn record_sent(&self, input: NewSentEvent) -> Result<NotificationEvent> {
        let row = self
            .db
            .insert_sent_event(CreateSentEventRow {
                user_id: input.user_id,
                lock_id: input.lock_id,
                campaign_name: input.campaign_name,
                batch_id: input.batch_id,
            })
            .await
            .map_err(|e| store_error("record_sent", e))?;

        Ok(row.into())
    }

    async fn mark_latest_clicked(
        &self,
        key: &CorrelationKey,
    ) -> Result<Option<NotificationEvent>> {
        let row = self
            .db
            .mark_latest_clicked(&key.user_id, &key.lock_id, &key.campaign_name)
            .await
            .map_err(|e| store_error("mark_latest_clicked", e))?;

        Ok(row.map(Into::into))
    }

    async fn campaign_counts(&self, campaign_name: &str) -> Result<Option<CampaignCounts>> {
        let row = self
            .db
            .campaign_counts(campaign_name)
            .await
            .map_err(|e| store_error("campaign_counts", e))?;

        Ok(row.map(Into::into))
    }

    async fn all_campaign_counts(&self) -> Result<Vec<CampaignCounts>> {
        let rows = self
            .db
            .all_campaign_counts()
            .await
            .map_err(|e| store_error("all_campaign_counts", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn user_events(&self, user_id: &str) -> Result<Vec<NotificationEvent>> {
        let rows = self
            .db
            .list_user_events(user_id)
            .await
            .map_err(|e| store_error("user_events", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
