// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - DbEventStore: implements EventStore over campaign_analytics
// - DbSubscriptionDirectory: implements SubscriptionDirectory over lock_user_mapping

pub mod config;
pub mod event_store;
pub mod models;
pub mod repositories;
pub mod subscription_directory;

pub use config::DatabaseConfig;
pub use event_store::DbEventStore;
pub use models::*;
pub use repositories::*;
pub use subscription_directory::DbSubscriptionDirectory;
