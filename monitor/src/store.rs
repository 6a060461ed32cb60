use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::records::{LinkFilter, McRecord, SddRecord, Timestamped};
use crate::storage;

const SDD_FILE: &str = "sdd.jsonl";
const MC_FILE: &str = "mc.jsonl";
const WATCHDOG_FILE: &str = "watchdog.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("no watchdog heartbeat has been recorded")]
    NoHeartbeat,
}

/// Owned, newest-first sequence of records produced by a scan.
pub type Scan<T> = Box<dyn Iterator<Item = T> + Send>;

/// Upstream source of raw telemetry.
///
/// Scans return at most `limit` records ordered by timestamp, newest first.
/// The Es/N0 scan applies its link filter before the limit.
pub trait RecordStore: Send + Sync {
    fn scan_sdd(&self, limit: usize, filter: &LinkFilter) -> Result<Scan<SddRecord>, StoreError>;
    fn scan_mc(&self, limit: usize) -> Result<Scan<McRecord>, StoreError>;
    fn insert_sdd(&self, record: SddRecord) -> Result<(), StoreError>;
    fn insert_mc(&self, record: McRecord) -> Result<(), StoreError>;
    fn watchdog(&self) -> Result<DateTime<Utc>, StoreError>;
    fn touch_watchdog(&self, ts: DateTime<Utc>) -> Result<(), StoreError>;
    /// Drops every record older than `cutoff`.
    fn prune(&self, cutoff: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Records kept ascending by timestamp; equal timestamps keep arrival order.
struct Collection<T> {
    records: Vec<T>,
    file: Option<PathBuf>,
}

impl<T: Timestamped + Clone + Serialize> Collection<T> {
    fn insert(&mut self, record: T) {
        if let Some(path) = &self.file {
            if let Err(e) = storage::append_line(path, &record) {
                warn!("failed to persist record to {}: {e}", path.display());
            }
        }
        let ts = record.timestamp();
        let idx = self.records.partition_point(|r| r.timestamp() <= ts);
        self.records.insert(idx, record);
    }

    fn newest(&self, limit: usize) -> Vec<T> {
        self.newest_where(limit, |_| true)
    }

    /// Newest `limit` records that satisfy `keep`; the cap counts matches only.
    fn newest_where(&self, limit: usize, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .iter()
            .rev()
            .filter(|r| keep(r))
            .take(limit)
            .cloned()
            .collect()
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let keep_from = self.records.partition_point(|r| r.timestamp() < cutoff);
        if keep_from == 0 {
            return 0;
        }
        self.records.drain(..keep_from);
        if let Some(path) = &self.file {
            if let Err(e) = storage::rewrite_lines(path, self.records.iter()) {
                warn!("failed to rewrite {}: {e}", path.display());
            }
        }
        keep_from
    }
}

#[derive(Serialize, Deserialize)]
struct WatchdogRecord {
    key: String,
    val: DateTime<Utc>,
}

const WATCHDOG_KEY: &str = "watchdog_ts";

/// In-memory record store, optionally backed by JSON-lines files.
pub struct MemoryStore {
    sdd: RwLock<Collection<SddRecord>>,
    mc: RwLock<Collection<McRecord>>,
    watchdog: RwLock<Option<DateTime<Utc>>>,
    watchdog_file: Option<PathBuf>,
}

impl MemoryStore {
    /// A store that keeps nothing on disk.
    pub fn new() -> Self {
        MemoryStore {
            sdd: RwLock::new(Collection {
                records: Vec::new(),
                file: None,
            }),
            mc: RwLock::new(Collection {
                records: Vec::new(),
                file: None,
            }),
            watchdog: RwLock::new(None),
            watchdog_file: None,
        }
    }

    /// Loads (or starts) the persisted collections under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let mut sdd: Vec<SddRecord> = storage::load_lines(&data_dir.join(SDD_FILE))?;
        let mut mc: Vec<McRecord> = storage::load_lines(&data_dir.join(MC_FILE))?;
        sdd.sort_by_key(|r| r.ts);
        mc.sort_by_key(|r| r.ts);

        let watchdog_file = data_dir.join(WATCHDOG_FILE);
        let watchdog = storage::load_value::<WatchdogRecord>(&watchdog_file)?
            .filter(|record| record.key == WATCHDOG_KEY)
            .map(|record| record.val);

        info!(
            sdd = sdd.len(),
            mc = mc.len(),
            "loaded record store from {}",
            data_dir.display()
        );

        Ok(MemoryStore {
            sdd: RwLock::new(Collection {
                records: sdd,
                file: Some(data_dir.join(SDD_FILE)),
            }),
            mc: RwLock::new(Collection {
                records: mc,
                file: Some(data_dir.join(MC_FILE)),
            }),
            watchdog: RwLock::new(watchdog),
            watchdog_file: Some(watchdog_file),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn scan_sdd(&self, limit: usize, filter: &LinkFilter) -> Result<Scan<SddRecord>, StoreError> {
        let sdd = self.sdd.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Box::new(sdd.newest_where(limit, |r| filter.matches(r)).into_iter()))
    }

    fn scan_mc(&self, limit: usize) -> Result<Scan<McRecord>, StoreError> {
        let mc = self.mc.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Box::new(mc.newest(limit).into_iter()))
    }

    fn insert_sdd(&self, record: SddRecord) -> Result<(), StoreError> {
        self.sdd
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(record);
        Ok(())
    }

    fn insert_mc(&self, record: McRecord) -> Result<(), StoreError> {
        self.mc
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(record);
        Ok(())
    }

    fn watchdog(&self) -> Result<DateTime<Utc>, StoreError> {
        let heartbeat = *self.watchdog.read().map_err(|_| StoreError::Poisoned)?;
        heartbeat.ok_or(StoreError::NoHeartbeat)
    }

    fn touch_watchdog(&self, ts: DateTime<Utc>) -> Result<(), StoreError> {
        *self.watchdog.write().map_err(|_| StoreError::Poisoned)? = Some(ts);
        if let Some(path) = &self.watchdog_file {
            let record = WatchdogRecord {
                key: WATCHDOG_KEY.to_owned(),
                val: ts,
            };
            if let Err(e) = storage::save_value(path, &record) {
                warn!("failed to persist watchdog heartbeat: {e}");
            }
        }
        Ok(())
    }

    fn prune(&self, cutoff: DateTime<Utc>) -> Result<(), StoreError> {
        // Lock ordering: sdd first, then mc
        let dropped_sdd = self
            .sdd
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .prune(cutoff);
        let dropped_mc = self
            .mc
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .prune(cutoff);
        if dropped_sdd + dropped_mc > 0 {
            info!(sdd = dropped_sdd, mc = dropped_mc, "pruned records older than {cutoff}");
        }
        Ok(())
    }
}
