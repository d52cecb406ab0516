// API server configuration

use lockwatch_core::{env_non_empty, Error, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CONFIRMATION_PATH: &str = "/api/battery-checked";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub port: u16,
    /// Route receiving battery-check confirmations from the app
    pub confirmation_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            confirmation_path: DEFAULT_CONFIRMATION_PATH.to_string(),
        }
    }
}

impl ApiConfig {
    /// Load from PORT and CONFIRMATION_PATH
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = env_non_empty("PORT") {
            config.port = raw
                .parse()
                .map_err(|_| Error::config(format!("PORT must be a port number, got {raw:?}")))?;
        }
        if let Some(path) = env_non_empty("CONFIRMATION_PATH") {
            config.confirmation_path = path;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.confirmation_path.starts_with('/') {
            return Err(Error::config(format!(
                "CONFIRMATION_PATH must start with '/', got {:?}",
                self.confirmation_path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.confirmation_path, "/api/battery-checked");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_confirmation_path_is_rejected() {
        let config = ApiConfig {
            confirmation_path: "battery-checked".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
