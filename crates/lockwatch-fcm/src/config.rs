// FCM gateway configuration

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lockwatch_core::{env_non_empty, env_required, Error, Result};

use crate::types::ServiceAccount;

pub const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub service_account: ServiceAccount,
    /// Base URL; messages go to `{endpoint}/v1/projects/{project}/messages:send`
    pub endpoint: String,
}

impl FcmConfig {
    pub fn new(service_account: ServiceAccount) -> Self {
        Self {
            service_account,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Load from FIREBASE_BASE64 (base64 of the service-account JSON) and
    /// the optional FCM_ENDPOINT override
    pub fn from_env() -> Result<Self> {
        let encoded = env_required("FIREBASE_BASE64")?;
        let mut config = Self::new(decode_service_account(&encoded)?);
        if let Some(endpoint) = env_non_empty("FCM_ENDPOINT") {
            config = config.with_endpoint(endpoint);
        }
        Ok(config)
    }
}

pub fn decode_service_account(encoded: &str) -> Result<ServiceAccount> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::config(format!("FIREBASE_BASE64 is not valid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::config(format!("FIREBASE_BASE64 is not a service-account key: {e}")))
}
