//! Raw telemetry records as written by the receiver daemon.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything stored in a time-ordered collection.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// A scalar reading that can be folded into a grouped average.
pub trait Observation: Timestamped {
    type Dims: Clone + Eq + std::hash::Hash;

    fn dims(&self) -> Self::Dims;
    fn value(&self) -> f64;
}

/// Receiver / network segment pair a reading was taken on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub rx: String,
    pub ns: String,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.ns, self.rx)
    }
}

/// Optional restriction of the Es/N0 chart to one receiver and/or segment.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub rx: Option<String>,
    pub ns: Option<String>,
}

impl LinkFilter {
    pub fn matches(&self, record: &SddRecord) -> bool {
        self.rx.as_ref().is_none_or(|rx| *rx == record.rx)
            && self.ns.as_ref().is_none_or(|ns| *ns == record.ns)
    }
}

/// Signal-quality (Es/N0) sample for one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SddRecord {
    pub ts: DateTime<Utc>,
    pub rx: String,
    pub ns: String,
    pub esno: f64,
}

impl Timestamped for SddRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.ts
    }
}

impl Observation for SddRecord {
    type Dims = Link;

    fn dims(&self) -> Link {
        Link {
            rx: self.rx.clone(),
            ns: self.ns.clone(),
        }
    }

    fn value(&self) -> f64 {
        self.esno
    }
}

/// MODCOD usage snapshot: one magnitude per entry of the MODCOD table, in
/// table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McRecord {
    pub ts: DateTime<Utc>,
    /// Throughput in Mbit/s over the accumulation window
    #[serde(default)]
    pub bit_rate: f64,
    /// Frames counted over the accumulation window
    #[serde(default)]
    pub total: u64,
    pub arr: Vec<f64>,
}

impl Timestamped for McRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.ts
    }
}
