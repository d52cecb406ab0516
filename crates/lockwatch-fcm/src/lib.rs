// Firebase Cloud Messaging push gateway
//
// Implements `lockwatch_core::PushGateway` over the FCM HTTP v1 API.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod types;

pub use auth::{AccessTokenSource, ServiceAccountTokenSource, StaticTokenSource};
pub use config::FcmConfig;
pub use gateway::FcmGateway;
pub use types::ServiceAccount;
