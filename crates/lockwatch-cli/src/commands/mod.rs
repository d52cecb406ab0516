pub mod campaign;
pub mod dashboard;
pub mod user;

use chrono::{DateTime, Utc};

/// Timestamps in text output: UTC to the second
pub(crate) fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn format_optional_time(ts: &Option<DateTime<Utc>>) -> String {
    ts.as_ref().map(format_time).unwrap_or_else(|| "-".to_string())
}
