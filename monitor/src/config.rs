//! Behavioral constants for scanning, sampling, retention, and health checks.

use chrono::Duration;

/// Most records a single chart request pulls from the store.
pub const SCAN_LIMIT: usize = 10_000;
/// Records folded per worker when a scan is aggregated in parallel.
pub const PARTITION_SIZE: usize = 2_500;
/// How many records a fold processes between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: usize = 256;

/// Approximate number of points the MODCOD chart is sampled down to.
pub const DOWNSAMPLE_TARGET: usize = 100;

/// Heartbeats older than this mark the receiver daemon as down.
pub const WATCHDOG_THRESHOLD_SECS: i64 = 60;

pub const DATA_RETENTION: Duration = Duration::days(30);
pub const PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);
