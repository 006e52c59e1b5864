//! Time utilities and constants for cnrates.

use chrono::{DateTime, Duration, Local, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a combined snapshot is served before refetching (5 minutes).
    pub fn cache_window() -> Duration {
        Duration::minutes(5)
    }
}

/// Format used for every date in rate results.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Today's local calendar date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Check whether `since` is less than `window` old.
pub fn is_within(since: Timestamp, window: Duration) -> bool {
    now().signed_duration_since(since) < window
}
