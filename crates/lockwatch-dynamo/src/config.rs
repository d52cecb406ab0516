// DynamoDB registry configuration

use lockwatch_core::{env_non_empty, env_required, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TABLE: &str = "locks";

/// Static AWS credentials used for request signing
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DynamoConfig {
    pub region: String,
    pub table: String,
    /// Full endpoint URL; defaults to the regional public endpoint
    pub endpoint: String,
    pub credentials: AwsCredentials,
}

impl DynamoConfig {
    pub fn new(region: impl Into<String>, credentials: AwsCredentials) -> Self {
        let region = region.into();
        Self {
            endpoint: regional_endpoint(&region),
            region,
            table: DEFAULT_TABLE.to_string(),
            credentials,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Load from AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY,
    /// AWS_SESSION_TOKEN, LOCKS_TABLE and DYNAMODB_ENDPOINT
    pub fn from_env() -> Result<Self> {
        let region = env_non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let credentials = AwsCredentials {
            access_key_id: env_required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: env_required("AWS_SECRET_ACCESS_KEY")?,
            session_token: env_non_empty("AWS_SESSION_TOKEN"),
        };

        let mut config = Self::new(region, credentials);
        if let Some(table) = env_non_empty("LOCKS_TABLE") {
            config = config.with_table(table);
        }
        if let Some(endpoint) = env_non_empty("DYNAMODB_ENDPOINT") {
            config = config.with_endpoint(endpoint);
        }
        Ok(config)
    }
}

fn regional_endpoint(region: &str) -> String {
    format!("https://dynamodb.{region}.amazonaws.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: Some("token".to_string()),
        }
    }

    #[test]
    fn test_defaults_to_regional_endpoint_and_locks_table() {
        let config = DynamoConfig::new("eu-west-1", creds());
        assert_eq!(config.endpoint, "https://dynamodb.eu-west-1.amazonaws.com");
        assert_eq!(config.table, "locks");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", creds());
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("\"token\""));
    }
}
