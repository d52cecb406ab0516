// Dispatch run configuration
//
// DispatchConfig can be:
// - Created directly (tests, embedding)
// - Loaded from environment variables via `from_env`

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::push::NotificationTemplate;
use crate::scanner::stale_cutoff;

pub const DEFAULT_CAMPAIGN: &str = "battery_low_alert";
pub const DEFAULT_STALE_THRESHOLD_DAYS: i64 = 30;

/// Configuration for one scan + dispatch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Campaign tag written on every recorded send
    pub campaign_name: String,

    /// Locks not checked within this many days are stale
    #[serde(default = "default_threshold_days")]
    pub stale_threshold_days: i64,

    /// Maximum in-flight gateway calls (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub template: NotificationTemplate,
}

fn default_threshold_days() -> i64 {
    DEFAULT_STALE_THRESHOLD_DAYS
}

fn default_concurrency() -> usize {
    1
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            campaign_name: DEFAULT_CAMPAIGN.to_string(),
            stale_threshold_days: default_threshold_days(),
            concurrency: default_concurrency(),
            template: NotificationTemplate::default(),
        }
    }
}

impl DispatchConfig {
    /// Load from CAMPAIGN_NAME, STALE_THRESHOLD_DAYS, DISPATCH_CONCURRENCY,
    /// NOTIFICATION_TITLE and NOTIFICATION_BODY
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = env_non_empty("CAMPAIGN_NAME") {
            config.campaign_name = name;
        }
        if let Some(days) = env_non_empty("STALE_THRESHOLD_DAYS") {
            config.stale_threshold_days = days
                .parse()
                .map_err(|_| Error::config(format!("STALE_THRESHOLD_DAYS is not a number: {days}")))?;
        }
        if let Some(n) = env_non_empty("DISPATCH_CONCURRENCY") {
            config.concurrency = n
                .parse()
                .map_err(|_| Error::config(format!("DISPATCH_CONCURRENCY is not a number: {n}")))?;
        }
        if let Some(title) = env_non_empty("NOTIFICATION_TITLE") {
            config.template.title = title;
        }
        if let Some(body) = env_non_empty("NOTIFICATION_BODY") {
            config.template.body = body;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> Result<()> {
        if self.campaign_name.trim().is_empty() {
            return Err(Error::config("campaign name must not be empty"));
        }
        if self.stale_threshold_days < 0 {
            return Err(Error::config("stale threshold must not be negative"));
        }
        stale_cutoff(Utc::now(), self.stale_threshold()?)?;
        if self.concurrency == 0 {
            return Err(Error::config("dispatch concurrency must be at least 1"));
        }
        Ok(())
    }

    pub fn stale_threshold(&self) -> Result<Duration> {
        Duration::try_days(self.stale_threshold_days).ok_or_else(|| {
            Error::config(format!(
                "stale threshold of {} days is out of range",
                self.stale_threshold_days
            ))
        })
    }

    pub fn with_campaign(mut self, campaign_name: impl Into<String>) -> Self {
        self.campaign_name = campaign_name.into();
        self
    }

    pub fn with_threshold_days(mut self, days: i64) -> Self {
        self.stale_threshold_days = days;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Read an environment variable, treating empty values as unset
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read a required environment variable
pub fn env_required(key: &str) -> Result<String> {
    env_non_empty(key).ok_or_else(|| Error::config(format!("{key} environment variable required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_battery_campaign() {
        let config = DispatchConfig::default();
        assert_eq!(config.campaign_name, "battery_low_alert");
        assert_eq!(config.stale_threshold().unwrap(), Duration::days(30));
        assert_eq!(config.concurrency, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = DispatchConfig::default().with_concurrency(0);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_threshold() {
        let config = DispatchConfig::default().with_threshold_days(200_000_000);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = DispatchConfig::default().with_threshold_days(i64::MAX);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        assert!(matches!(config.stale_threshold(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_accepts_long_but_representable_threshold() {
        let config = DispatchConfig::default().with_threshold_days(3650);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_campaign() {
        let config = DispatchConfig::default().with_campaign("  ");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
