// Click correlator
//
// Attributes an inbound confirmation to the newest outstanding send for the
// same (campaign, user, lock).

use std::sync::Arc;

use crate::error::Result;
use crate::event::{CorrelationKey, NotificationEvent};
use crate::traits::EventStore;

/// Outcome of one correlation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation {
    /// This event was flipped to clicked
    Clicked(NotificationEvent),
    /// No outstanding send for the key; nothing changed
    NoMatch,
}

impl Correlation {
    pub fn is_match(&self) -> bool {
        matches!(self, Correlation::Clicked(_))
    }
}

pub struct ClickCorrelator {
    store: Arc<dyn EventStore>,
}

impl ClickCorrelator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn correlate(&self, key: &CorrelationKey) -> Result<Correlation> {
        match self.store.mark_latest_clicked(key).await? {
            Some(event) => {
                tracing::info!(
                    campaign = %key.campaign_name,
                    user_id = %key.user_id,
                    lock_id = %key.lock_id,
                    event_id = %event.id,
                    "Notification marked clicked"
                );
                Ok(Correlation::Clicked(event))
            }
            None => {
                tracing::info!(
                    campaign = %key.campaign_name,
                    user_id = %key.user_id,
                    lock_id = %key.lock_id,
                    "No sent notification found to mark as clicked"
                );
                Ok(Correlation::NoMatch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::NewSentEvent;
    use crate::memory::InMemoryEventStore;
    use chrono::{Duration, Utc};

    fn sent(user: &str, lock: &str, campaign: &str) -> NewSentEvent {
        NewSentEvent {
            user_id: user.to_string(),
            lock_id: lock.to_string(),
            campaign_name: campaign.to_string(),
            batch_id: None,
        }
    }

    #[tokio::test]
    async fn test_no_outstanding_send_is_noop() {
        let store = InMemoryEventStore::new();
        store.record_sent(sent("u1", "l1", "other")).await.unwrap();
        let before = store.events().await;

        let correlator = ClickCorrelator::new(Arc::new(store.clone()));
        let result = correlator
            .correlate(&CorrelationKey::new("battery_low_alert", "u1", "l1"))
            .await
            .unwrap();

        assert_eq!(result, Correlation::NoMatch);
        assert_eq!(store.events().await, before);
    }

    #[tokio::test]
    async fn test_marks_only_newest_of_many() {
        let store = InMemoryEventStore::new();
        let base = Utc::now() - Duration::hours(3);
        let oldest = store.seed_sent(sent("u1", "l1", "c"), base).await;
        let middle = store
            .seed_sent(sent("u1", "l1", "c"), base + Duration::hours(1))
            .await;
        let newest = store
            .seed_sent(sent("u1", "l1", "c"), base + Duration::hours(2))
            .await;

        let correlator = ClickCorrelator::new(Arc::new(store.clone()));
        let result = correlator
            .correlate(&CorrelationKey::new("c", "u1", "l1"))
            .await
            .unwrap();

        match result {
            Correlation::Clicked(event) => assert_eq!(event.id, newest.id),
            Correlation::NoMatch => panic!("Expected a match"),
        }
        let events = store.events().await;
        let clicked: Vec<_> = events.iter().filter(|e| e.clicked).map(|e| e.id).collect();
        assert_eq!(clicked, vec![newest.id]);
        assert!(events.iter().any(|e| e.id == oldest.id && !e.clicked));
        assert!(events.iter().any(|e| e.id == middle.id && !e.clicked));
    }

    #[tokio::test]
    async fn test_second_correlation_moves_to_next_outstanding() {
        let store = InMemoryEventStore::new();
        let base = Utc::now() - Duration::hours(2);
        let older = store.seed_sent(sent("u1", "l1", "c"), base).await;
        store
            .seed_sent(sent("u1", "l1", "c"), base + Duration::hours(1))
            .await;
        let correlator = ClickCorrelator::new(Arc::new(store.clone()));
        let key = CorrelationKey::new("c", "u1", "l1");

        correlator.correlate(&key).await.unwrap();
        let second = correlator.correlate(&key).await.unwrap();

        assert_eq!(second, Correlation::Clicked(NotificationEvent { clicked: true, ..older }));
    }

    #[tokio::test]
    async fn test_repeat_after_match_is_noop() {
        let store = InMemoryEventStore::new();
        store.record_sent(sent("u1", "l1", "c")).await.unwrap();
        let correlator = ClickCorrelator::new(Arc::new(store.clone()));
        let key = CorrelationKey::new("c", "u1", "l1");

        assert!(correlator.correlate(&key).await.unwrap().is_match());
        assert_eq!(correlator.correlate(&key).await.unwrap(), Correlation::NoMatch);

        let events = store.events().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].clicked);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = InMemoryEventStore::new();
        store.set_unavailable(true);
        let correlator = ClickCorrelator::new(Arc::new(store));

        let err = correlator
            .correlate(&CorrelationKey::new("c", "u1", "l1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
