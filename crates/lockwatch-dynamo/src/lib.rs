// DynamoDB device registry
//
// Implements `lockwatch_core::DeviceRegistry` against the `locks` table using
// the DynamoDB JSON API with SigV4-signed requests.

pub mod config;
pub mod registry;
pub mod sigv4;

pub use config::{AwsCredentials, DynamoConfig};
pub use registry::DynamoDeviceRegistry;
