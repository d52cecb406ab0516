// Database connection configuration

use lockwatch_core::{env_non_empty, Error, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Read `DATABASE_URL` (falling back to `POSTGRES_URI`) and
    /// `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self> {
        let url = env_non_empty("DATABASE_URL")
            .or_else(|| env_non_empty("POSTGRES_URI"))
            .ok_or_else(|| Error::config("DATABASE_URL or POSTGRES_URI must be set"))?;

        let max_connections = match env_non_empty("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                Error::config(format!("DATABASE_MAX_CONNECTIONS must be a positive integer, got {raw:?}"))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(Error::config("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }

        Ok(Self { url, max_connections })
    }
}
