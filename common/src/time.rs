//! Time utilities and constants for the country cache.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Timing constants.
pub mod constants {
    use std::time::Duration;

    /// Default timeout applied to each external fetch (15 seconds).
    pub fn default_fetch_timeout() -> Duration {
        Duration::from_secs(15)
    }

    /// SQLite busy timeout (5 seconds).
    pub fn store_busy_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Capture the single logical timestamp shared by every record of a batch.
///
/// Truncated to milliseconds so the value survives a round trip through the
/// store and the API unchanged.
pub fn batch_timestamp() -> Timestamp {
    let now = now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Format a timestamp as ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_iso(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored ISO-8601 timestamp.
pub fn parse_iso(value: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Serde helper writing timestamps in the [`format_iso`] shape.
pub mod iso_millis {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso(ts))
    }

    /// Variant for optional timestamps.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_str(&format_iso(ts)),
                None => serializer.serialize_none(),
            }
        }
    }
}
