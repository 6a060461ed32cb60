//! Streaming group-by-and-average over raw readings.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bucket::{BucketKey, Granularity, bucket};
use crate::cancellation::CancellationToken;
use crate::config::CANCEL_CHECK_INTERVAL;
use crate::records::Observation;

/// Which member timestamp stands for a group on the chart.
///
/// `Latest` reproduces what the chart has always shown: the store is scanned
/// newest-first and the first reading seen in a bucket was the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representative {
    #[default]
    Latest,
    Earliest,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey<D> {
    pub bucket: BucketKey,
    pub dims: D,
}

/// Running summary of every reading folded into one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    count: u64,
    mean: f64,
}

impl GroupSummary {
    fn seed(ts: DateTime<Utc>, value: f64) -> Self {
        GroupSummary {
            earliest: ts,
            latest: ts,
            count: 1,
            mean: value,
        }
    }

    fn fold(&mut self, ts: DateTime<Utc>, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
        self.earliest = self.earliest.min(ts);
        self.latest = self.latest.max(ts);
    }

    /// Combines two partial summaries of the same group.
    pub fn merge(&mut self, other: &GroupSummary) {
        let total = self.count + other.count;
        self.mean =
            (self.count as f64 * self.mean + other.count as f64 * other.mean) / total as f64;
        self.count = total;
        self.earliest = self.earliest.min(other.earliest);
        self.latest = self.latest.max(other.latest);
    }

    pub fn representative(&self, policy: Representative) -> DateTime<Utc> {
        match policy {
            Representative::Latest => self.latest,
            Representative::Earliest => self.earliest,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[cfg(test)]
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Group summaries keyed by bucket and category for one granularity.
#[derive(Debug, Clone)]
pub struct GroupTable<D> {
    granularity: Granularity,
    groups: HashMap<GroupKey<D>, GroupSummary>,
}

impl<D: Clone + Eq + std::hash::Hash> GroupTable<D> {
    pub fn new(granularity: Granularity) -> Self {
        GroupTable {
            granularity,
            groups: HashMap::new(),
        }
    }

    pub fn observe<O: Observation<Dims = D>>(&mut self, record: &O) {
        let ts = record.timestamp();
        let key = GroupKey {
            bucket: bucket(ts, self.granularity),
            dims: record.dims(),
        };
        match self.groups.entry(key) {
            Entry::Occupied(mut e) => e.get_mut().fold(ts, record.value()),
            Entry::Vacant(e) => {
                e.insert(GroupSummary::seed(ts, record.value()));
            }
        }
    }

    pub fn merge(&mut self, other: GroupTable<D>) {
        debug_assert_eq!(self.granularity, other.granularity);
        for (key, summary) in other.groups {
            match self.groups.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().merge(&summary),
                Entry::Vacant(e) => {
                    e.insert(summary);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &GroupKey<D>) -> Option<&GroupSummary> {
        self.groups.get(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn into_groups(self) -> impl Iterator<Item = (GroupKey<D>, GroupSummary)> {
        self.groups.into_iter()
    }
}

/// The fold was abandoned because its token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Folds `records` into per-group running means.
///
/// Checks `token` every [`CANCEL_CHECK_INTERVAL`] records and stops with
/// [`Cancelled`] rather than returning a partial table.
pub fn aggregate<I, O>(
    records: I,
    granularity: Granularity,
    token: &CancellationToken,
) -> Result<GroupTable<O::Dims>, Cancelled>
where
    I: IntoIterator<Item = O>,
    O: Observation,
{
    let mut table = GroupTable::new(granularity);
    for (i, record) in records.into_iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
            return Err(Cancelled);
        }
        table.observe(&record);
    }
    if token.is_cancelled() {
        return Err(Cancelled);
    }
    Ok(table)
}

/// Splits a record stream into owned chunks of at most `size` records.
pub fn partition<T>(records: impl IntoIterator<Item = T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut iter = records.into_iter();
    let mut chunks = Vec::new();
    loop {
        let chunk: Vec<T> = iter.by_ref().take(size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

/// Folds each chunk on the blocking pool and merges the partial tables with
/// count-weighted means.
pub async fn aggregate_partitioned<O>(
    chunks: Vec<Vec<O>>,
    granularity: Granularity,
    token: CancellationToken,
) -> Result<GroupTable<O::Dims>, Cancelled>
where
    O: Observation + Send + 'static,
    O::Dims: Send + 'static,
{
    let tasks = chunks.into_iter().map(|chunk| {
        let token = token.clone();
        tokio::task::spawn_blocking(move || aggregate(chunk, granularity, &token))
    });

    let partials = match futures::future::try_join_all(tasks).await {
        Ok(partials) => partials,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => return Err(Cancelled),
    };

    let mut table = GroupTable::new(granularity);
    for partial in partials {
        table.merge(partial?);
    }
    Ok(table)
}
