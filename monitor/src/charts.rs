pub mod aggregate;
pub mod bucket;
pub mod downsample;
pub mod series;
pub mod svg;

use std::sync::Arc;

use tracing::debug;

use crate::cancellation;
use crate::config::{DOWNSAMPLE_TARGET, PARTITION_SIZE, SCAN_LIMIT};
use crate::error::Error;
use crate::records::{LinkFilter, McRecord};
use crate::state::AppState;

use self::aggregate::{aggregate_partitioned, partition};
use self::bucket::Granularity;
use self::downsample::downsample;
use self::series::{Point, Sample, Series};

/// Averaged Es/N0 chart: newest readings grouped per bucket and link.
///
/// Fails with [`Error::Timeout`] if the fold does not finish within the
/// request timeout; a partial chart is never returned.
pub async fn esno_chart(
    state: &AppState,
    granularity: Granularity,
    filter: LinkFilter,
) -> Result<Vec<Series<Point>>, Error> {
    let chunks = partition(state.store.scan_sdd(SCAN_LIMIT, &filter)?, PARTITION_SIZE);
    let scanned: usize = chunks.iter().map(Vec::len).sum();

    let (handle, token) = cancellation::channel();
    let folded = tokio::time::timeout(
        state.request_timeout,
        aggregate_partitioned(chunks, granularity, token),
    )
    .await;
    let table = match folded {
        Ok(Ok(table)) => table,
        Ok(Err(_)) | Err(_) => {
            handle.cancel();
            return Err(Error::Timeout(state.request_timeout));
        }
    };
    let groups = table.len();

    let series = series::build_averaged(
        table,
        state.charts.aggregation.representative,
        |link| link.to_string(),
    );
    debug!(
        %granularity,
        scanned,
        groups,
        series = series.len(),
        "built esno chart"
    );
    Ok(series)
}

/// MODCOD distribution chart: newest snapshots, stride-sampled, one series
/// per configured MODCOD.
///
/// Runs on the blocking pool under the request timeout, like the Es/N0 chart.
pub async fn modcod_chart(state: &AppState) -> Result<Vec<Series<Sample>>, Error> {
    let store = Arc::clone(&state.store);
    let categories = state.charts.modcods.clone();
    let work = tokio::task::spawn_blocking(move || -> Result<Vec<Series<Sample>>, Error> {
        let records: Vec<McRecord> = store.scan_mc(SCAN_LIMIT)?.collect();
        let scanned = records.len();
        let sampled = downsample(records, DOWNSAMPLE_TARGET);

        let series = series::build_distribution(&sampled, &categories)?;
        debug!(scanned, sampled = sampled.len(), "built modcod chart");
        Ok(series)
    });

    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Ok(Err(_)) | Err(_) => Err(Error::Timeout(state.request_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::chart_config;
    use crate::records::SddRecord;
    use crate::store::{MemoryStore, RecordStore};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, 14, 0, 0, 0).unwrap()
    }

    fn state_with(store: MemoryStore) -> AppState {
        AppState::new(
            Arc::new(store),
            chart_config::load(None).unwrap(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn esno_chart_only_sees_the_newest_scan_window() {
        let store = MemoryStore::new();
        // One reading per minute; the oldest ones fall outside the scan cap
        for i in 0..(SCAN_LIMIT as i64 + 120) {
            let esno = if i < 120 { 1.0 } else { 9.0 };
            store
                .insert_sdd(SddRecord {
                    ts: t0() + chrono::Duration::minutes(i),
                    rx: "RX1".into(),
                    ns: "Zurich".into(),
                    esno,
                })
                .unwrap();
        }
        let state = state_with(store);

        let series = esno_chart(&state, Granularity::Day, LinkFilter::default())
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert!(series[0].values.iter().all(|p| p.y == Some(9.0)));
        assert!(series[0].values.windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[tokio::test]
    async fn esno_chart_applies_the_link_filter() {
        let store = MemoryStore::new();
        for (rx, ns) in [("RX1", "Zurich"), ("RX2", "Zurich"), ("RX1", "Bern")] {
            store
                .insert_sdd(SddRecord {
                    ts: t0(),
                    rx: rx.into(),
                    ns: ns.into(),
                    esno: 10.0,
                })
                .unwrap();
        }
        let state = state_with(store);

        let filter = LinkFilter {
            rx: Some("RX1".into()),
            ns: None,
        };
        let series = esno_chart(&state, Granularity::Hour, filter).await.unwrap();
        let keys: Vec<&str> = series.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Bern on RX1", "Zurich on RX1"]);
    }

    #[tokio::test]
    async fn filtered_chart_keeps_a_full_scan_window_for_its_link() {
        let store = MemoryStore::new();
        // Older Bern readings, then a flood of newer Zurich readings
        for i in 0..100 {
            store
                .insert_sdd(SddRecord {
                    ts: t0() + chrono::Duration::minutes(i),
                    rx: "RX1".into(),
                    ns: "Bern".into(),
                    esno: 7.0,
                })
                .unwrap();
        }
        for i in 0..SCAN_LIMIT as i64 {
            store
                .insert_sdd(SddRecord {
                    ts: t0() + chrono::Duration::minutes(100 + i),
                    rx: "RX1".into(),
                    ns: "Zurich".into(),
                    esno: 9.0,
                })
                .unwrap();
        }
        let state = state_with(store);

        let filter = LinkFilter {
            rx: None,
            ns: Some("Bern".into()),
        };
        let series = esno_chart(&state, Granularity::Minute, filter).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, "Bern on RX1");
        assert_eq!(series[0].values.len(), 100);
    }

    fn populated_store(records: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..records {
            let ts = t0() + chrono::Duration::seconds(i as i64 * 30);
            store
                .insert_sdd(SddRecord {
                    ts,
                    rx: "RX1".into(),
                    ns: "Zurich".into(),
                    esno: 10.0,
                })
                .unwrap();
            store
                .insert_mc(McRecord {
                    ts,
                    bit_rate: 50.0,
                    total: 100,
                    arr: vec![1.0 / 28.0; 28],
                })
                .unwrap();
        }
        store
    }

    fn state_with_timeout(store: MemoryStore, timeout: Duration) -> AppState {
        AppState::new(
            Arc::new(store),
            chart_config::load(None).unwrap(),
            timeout,
        )
    }

    #[tokio::test]
    async fn esno_chart_times_out_instead_of_returning_partial_series() {
        let state = state_with_timeout(populated_store(SCAN_LIMIT), Duration::ZERO);
        let result = esno_chart(&state, Granularity::Minute, LinkFilter::default()).await;
        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::ZERO));
    }

    #[tokio::test]
    async fn modcod_chart_honours_the_request_timeout() {
        let state = state_with_timeout(populated_store(SCAN_LIMIT), Duration::ZERO);
        let result = modcod_chart(&state).await;
        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::ZERO));
    }

    #[tokio::test]
    async fn modcod_chart_samples_to_about_a_hundred_points() {
        let store = MemoryStore::new();
        for i in 0..1_000 {
            let mut arr = vec![0.0; 28];
            arr[i % 28] = 1.0;
            store
                .insert_mc(McRecord {
                    ts: t0() + chrono::Duration::seconds(i as i64 * 30),
                    bit_rate: 50.0,
                    total: 100,
                    arr,
                })
                .unwrap();
        }
        let state = state_with(store);

        let series = modcod_chart(&state).await.unwrap();
        assert_eq!(series.len(), 28);
        assert!(series.iter().all(|s| s.values.len() == 100));
        assert!(series[0].values.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[tokio::test]
    async fn modcod_chart_on_empty_store_keeps_every_series() {
        let state = state_with(MemoryStore::new());
        let series = modcod_chart(&state).await.unwrap();
        assert_eq!(series.len(), 28);
        assert!(series.iter().all(|s| s.values.is_empty()));
    }
}
