// Error types for scanning, dispatch, correlation and reporting

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by core services and their collaborators
///
/// "Not found" is never an error here: absent campaigns and unmatched
/// correlations are expressed as `Option::None` / `Correlation::NoMatch`.
#[derive(Debug, Error)]
pub enum Error {
    /// Device registry, subscription mapping or push gateway unreachable
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Event store could not serve the request
    #[error("Event store unavailable: {0}")]
    StoreUnavailable(String),

    /// Missing credentials or setup; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The push gateway refused this particular message (e.g. stale token)
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// Operation aborted by an external cancellation signal
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Create an upstream-unavailable error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::UpstreamUnavailable(msg.into())
    }

    /// Create an event store error
    pub fn store(msg: impl Into<String>) -> Self {
        Error::StoreUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a gateway rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Error::Rejected(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
