//! Assembles grouped or sampled data into the series the chart frontend reads.

use std::collections::BTreeMap;
use std::hash::Hash;

use serde::Serialize;

use super::aggregate::{GroupTable, Representative};
use crate::error::Error;
use crate::records::{McRecord, Timestamped};

/// One named, time-ordered line of chart points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<P> {
    pub key: String,
    pub values: Vec<P>,
}

/// Averaged point: `{"x": millis, "y": value | null}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: i64,
    pub y: Option<f64>,
}

/// Sampled point, serialized as a `[millis, value]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample(pub i64, pub f64);

/// An average of exactly zero means the link was lost, which the chart shows
/// as a gap rather than a dip to zero.
fn signal_value(mean: f64) -> Option<f64> {
    if mean == 0.0 { None } else { Some(mean) }
}

/// One series per distinct category label, sorted by label, points ascending.
pub fn build_averaged<D, F>(
    table: GroupTable<D>,
    representative: Representative,
    label: F,
) -> Vec<Series<Point>>
where
    D: Clone + Eq + Hash,
    F: Fn(&D) -> String,
{
    let mut by_label: BTreeMap<String, Vec<Point>> = BTreeMap::new();
    for (key, summary) in table.into_groups() {
        by_label.entry(label(&key.dims)).or_default().push(Point {
            x: summary.representative(representative).timestamp_millis(),
            y: signal_value(summary.mean()),
        });
    }

    by_label
        .into_iter()
        .map(|(key, mut values)| {
            values.sort_by_key(|p| p.x);
            Series { key, values }
        })
        .collect()
}

/// One series per table entry, in table order, even when no record carries
/// data for it.
///
/// Every record must hold exactly one magnitude per table entry; anything else
/// means the table and the stored data disagree.
pub fn build_distribution(
    records: &[McRecord],
    categories: &[String],
) -> Result<Vec<Series<Sample>>, Error> {
    let mut series: Vec<Series<Sample>> = categories
        .iter()
        .map(|name| Series {
            key: name.clone(),
            values: Vec::with_capacity(records.len()),
        })
        .collect();

    let mut ordered: Vec<&McRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.timestamp());

    for record in ordered {
        if record.arr.len() != categories.len() {
            return Err(Error::MalformedRecord {
                expected: categories.len(),
                found: record.arr.len(),
            });
        }
        let x = record.timestamp().timestamp_millis();
        for (s, value) in series.iter_mut().zip(&record.arr) {
            s.values.push(Sample(x, *value));
        }
    }

    Ok(series)
}
