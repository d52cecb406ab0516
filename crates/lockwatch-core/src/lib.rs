// Lockwatch core
//
// Storage- and vendor-agnostic pipeline for stale-lock notifications:
// - StaleScanner: device registry + subscription mapping → dispatch targets
// - Dispatcher: push gateway fan-out with per-target failure isolation
// - ClickCorrelator: confirmation → newest outstanding send marked clicked
// - Reporter: campaign and user statistics over the event store
//
// Backends plug in through the traits in `traits`; `memory` provides
// in-memory implementations for tests and local runs.

pub mod cancel;
pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod memory;
pub mod push;
pub mod report;
pub mod reporter;
pub mod resource;
pub mod scanner;
pub mod traits;

// Re-exports for convenience
pub use cancel::run_cancellable;
pub use config::{env_non_empty, env_required, DispatchConfig};
pub use correlator::{ClickCorrelator, Correlation};
pub use dispatcher::{DispatchSummary, Dispatcher};
pub use error::{Error, Result};
pub use event::{CorrelationKey, EventType, NewSentEvent, NotificationEvent};
pub use push::{NotificationTemplate, PushMessage};
pub use report::{CampaignCounts, CampaignStats, OverallPerformance, UserEngagement};
pub use reporter::Reporter;
pub use resource::{DispatchTarget, StaleResource};
pub use scanner::{ScanOutcome, StaleScanner};
pub use traits::{DeviceRegistry, EventStore, PushGateway, SubscriptionDirectory};

pub use tokio_util::sync::CancellationToken;
