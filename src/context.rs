//! Per-run context shared by every component of an invocation.

use chrono::{DateTime, Utc};

use crate::cache::DigestCache;

/// Format of the `$(System:TimeStamp)` variable
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// State created once at process start and passed down explicitly.
///
/// Holds the run timestamp, so every `$(System:TimeStamp)` placeholder in a
/// run resolves to the same value, and the digest cache shared by all
/// staleness checks of the run.
#[derive(Debug)]
pub struct RunContext {
    timestamp: String,
    digests: DigestCache,
}

impl RunContext {
    /// Create a context stamped with the current UTC time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a context stamped with a fixed time
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            digests: DigestCache::new("digest"),
        }
    }

    /// The run timestamp, `yyyyMMddHHmmss` in UTC
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// External image digests resolved so far in this run
    pub fn digests(&self) -> &DigestCache {
        &self.digests
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let context = RunContext::at(time);
        assert_eq!(context.timestamp(), "20240307090502");
    }

    #[test]
    fn test_timestamp_is_stable_within_run() {
        let context = RunContext::new();
        let first = context.timestamp().to_string();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(context.timestamp(), first);
        assert_eq!(first.len(), 14);
    }
}
