use chrono::{DateTime, Utc};

use crate::config::WATCHDOG_THRESHOLD_SECS;

/// Whole seconds since the daemon last wrote its heartbeat. Negative when the
/// heartbeat is ahead of the local clock.
pub fn age_secs(now: DateTime<Utc>, heartbeat: DateTime<Utc>) -> i64 {
    (now - heartbeat).num_seconds()
}

pub fn is_healthy(age_secs: i64) -> bool {
    age_secs <= WATCHDOG_THRESHOLD_SECS
}
