// In-memory implementations for tests and local runs
//
// These implementations keep all data in memory and mirror the semantics of
// the production backends, including store-assigned ids and timestamps and
// the atomic "flip the newest outstanding send" correlation.
// Each one can be switched to an unavailable state to exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event::{CorrelationKey, EventType, NewSentEvent, NotificationEvent};
use crate::push::PushMessage;
use crate::report::CampaignCounts;
use crate::resource::{DispatchTarget, StaleResource};
use crate::traits::{DeviceRegistry, EventStore, PushGateway, SubscriptionDirectory};

// ============================================================================
// InMemoryEventStore
// ============================================================================

#[derive(Debug, Default)]
struct EventLog {
    events: Vec<NotificationEvent>,
    last_sent_at: Option<DateTime<Utc>>,
}

impl EventLog {
    /// Strictly increasing clock so ordering ties cannot happen
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_sent_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_sent_at = Some(ts);
        ts
    }
}

/// In-memory event store
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<EventLog>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored event in insertion order
    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.log.read().await.events.clone()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert a sent event with an explicit timestamp (test fixtures only)
    pub async fn seed_sent(&self, input: NewSentEvent, sent_at: DateTime<Utc>) -> NotificationEvent {
        let event = NotificationEvent {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            lock_id: input.lock_id,
            campaign_name: input.campaign_name,
            event_type: EventType::Sent,
            sent_at,
            batch_id: input.batch_id,
            clicked: false,
        };
        let mut log = self.log.write().await;
        log.last_sent_at = Some(log.last_sent_at.map_or(sent_at, |last| last.max(sent_at)));
        log.events.push(event.clone());
        event
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::store("in-memory event store marked unavailable"));
        }
        Ok(())
    }
}

fn aggregate(campaign_name: &str, events: &[&NotificationEvent]) -> Option<CampaignCounts> {
    let first_sent_at = events.iter().map(|e| e.sent_at).min()?;
    let last_activity = events.iter().map(|e| e.sent_at).max()?;
    let clicked: Vec<_> = events.iter().filter(|e| e.clicked).collect();

    let unique_sent: HashSet<&str> = events.iter().map(|e| e.user_id.as_str()).collect();
    let unique_clicked: HashSet<&str> = clicked.iter().map(|e| e.user_id.as_str()).collect();

    Some(CampaignCounts {
        campaign_name: campaign_name.to_string(),
        sent_count: events.len() as i64,
        clicked_count: clicked.len() as i64,
        unique_users_sent: unique_sent.len() as i64,
        unique_users_clicked: unique_clicked.len() as i64,
        first_sent_at,
        last_clicked_at: clicked.iter().map(|e| e.sent_at).max(),
        last_activity,
    })
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn record_sent(&self, input: NewSentEvent) -> Result<NotificationEvent> {
        self.check_available()?;
        let mut log = self.log.write().await;
        let event = NotificationEvent {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            lock_id: input.lock_id,
            campaign_name: input.campaign_name,
            event_type: EventType::Sent,
            sent_at: log.next_timestamp(),
            batch_id: input.batch_id,
            clicked: false,
        };
        log.events.push(event.clone());
        Ok(event)
    }

    async fn mark_latest_clicked(
        &self,
        key: &CorrelationKey,
    ) -> Result<Option<NotificationEvent>> {
        self.check_available()?;
        // Select and flip under one write guard
        let mut log = self.log.write().await;
        let newest = log
            .events
            .iter_mut()
            .filter(|e| key.matches_unclicked(e))
            .max_by_key(|e| (e.sent_at, e.id));

        Ok(newest.map(|event| {
            event.clicked = true;
            event.clone()
        }))
    }

    async fn campaign_counts(&self, campaign_name: &str) -> Result<Option<CampaignCounts>> {
        self.check_available()?;
        let log = self.log.read().await;
        let events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.event_type == EventType::Sent && e.campaign_name == campaign_name)
            .collect();
        Ok(aggregate(campaign_name, &events))
    }

    async fn all_campaign_counts(&self) -> Result<Vec<CampaignCounts>> {
        self.check_available()?;
        let log = self.log.read().await;
        let mut by_campaign: BTreeMap<&str, Vec<&NotificationEvent>> = BTreeMap::new();
        for event in log.events.iter().filter(|e| e.event_type == EventType::Sent) {
            by_campaign
                .entry(event.campaign_name.as_str())
                .or_default()
                .push(event);
        }

        let mut counts: Vec<CampaignCounts> = by_campaign
            .into_iter()
            .filter_map(|(name, events)| aggregate(name, &events))
            .collect();
        counts.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(counts)
    }

    async fn user_events(&self, user_id: &str) -> Result<Vec<NotificationEvent>> {
        self.check_available()?;
        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| (b.sent_at, b.id).cmp(&(a.sent_at, a.id)));
        Ok(events)
    }
}

// ============================================================================
// InMemoryDeviceRegistry
// ============================================================================

/// In-memory device registry keyed by lock id
#[derive(Debug, Default, Clone)]
pub struct InMemoryDeviceRegistry {
    locks: Arc<RwLock<HashMap<String, Option<DateTime<Utc>>>>>,
    unavailable: Arc<AtomicBool>,
    checks_recorded: Arc<AtomicUsize>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lock with its last check time (`None` = never checked)
    pub async fn add_lock(&self, lock_id: impl Into<String>, last_checked_at: Option<DateTime<Utc>>) {
        self.locks.write().await.insert(lock_id.into(), last_checked_at);
    }

    pub async fn last_checked(&self, lock_id: &str) -> Option<DateTime<Utc>> {
        self.locks.read().await.get(lock_id).copied().flatten()
    }

    /// Number of successful `mark_checked` calls
    pub fn checks_recorded(&self) -> usize {
        self.checks_recorded.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::upstream("in-memory device registry marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn checked_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleResource>> {
        self.check_available()?;
        let mut stale: Vec<StaleResource> = self
            .locks
            .read()
            .await
            .iter()
            .filter_map(|(lock_id, checked)| {
                checked.filter(|at| *at < cutoff).map(|at| StaleResource {
                    lock_id: lock_id.clone(),
                    last_checked_at: at,
                })
            })
            .collect();
        stale.sort_by(|a, b| a.lock_id.cmp(&b.lock_id));
        Ok(stale)
    }

    async fn mark_checked(&self, lock_id: &str) -> Result<DateTime<Utc>> {
        self.check_available()?;
        let now = Utc::now();
        self.locks.write().await.insert(lock_id.to_string(), Some(now));
        self.checks_recorded.fetch_add(1, Ordering::SeqCst);
        Ok(now)
    }
}

// ============================================================================
// InMemorySubscriptionDirectory
// ============================================================================

/// In-memory lock → subscriber mapping
#[derive(Debug, Default, Clone)]
pub struct InMemorySubscriptionDirectory {
    targets: Arc<RwLock<Vec<DispatchTarget>>>,
    unavailable: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl InMemorySubscriptionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, target: DispatchTarget) {
        self.targets.write().await.push(target);
    }

    /// Number of `subscribers` calls served
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionDirectory for InMemorySubscriptionDirectory {
    async fn subscribers(&self, lock_ids: &[String]) -> Result<Vec<DispatchTarget>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::upstream("in-memory subscription directory marked unavailable"));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .targets
            .read()
            .await
            .iter()
            .filter(|t| lock_ids.contains(&t.lock_id))
            .cloned()
            .collect())
    }
}

// ============================================================================
// RecordingPushGateway
// ============================================================================

/// Push gateway that records every accepted message
///
/// Tokens registered with `reject_token` fail with `Rejected`; an optional
/// delay makes every send wait, which lets tests cancel mid-call.
#[derive(Debug, Default, Clone)]
pub struct RecordingPushGateway {
    sent: Arc<RwLock<Vec<PushMessage>>>,
    rejected_tokens: Arc<RwLock<HashSet<String>>>,
    delay: Option<std::time::Duration>,
    unavailable: Arc<AtomicBool>,
    counter: Arc<AtomicUsize>,
}

impl RecordingPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn reject_token(&self, token: impl Into<String>) {
        self.rejected_tokens.write().await.insert(token.into());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<PushMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::upstream("in-memory push gateway marked unavailable"));
        }
        if self.rejected_tokens.read().await.contains(&message.token) {
            return Err(Error::rejected(format!(
                "registration token not registered: {}",
                message.token
            )));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.write().await.push(message.clone());
        Ok(format!("projects/in-memory/messages/{n}"))
    }
}
