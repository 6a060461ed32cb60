use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::charts;
use crate::charts::bucket::Granularity;
use crate::charts::series::{Point, Sample, Series};
use crate::error::Error;
use crate::records::{LinkFilter, McRecord, SddRecord};
use crate::state::AppState;
use crate::watchdog;

#[derive(Deserialize, Default)]
pub struct EsnoParams {
    interval: Option<String>,
    rx: Option<String>,
    ns: Option<String>,
}

pub async fn esno(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EsnoParams>,
) -> Result<Json<Vec<Series<Point>>>, Error> {
    let granularity: Granularity = params.interval.as_deref().unwrap_or_default().parse()?;
    let filter = LinkFilter {
        rx: params.rx,
        ns: params.ns,
    };
    let series = charts::esno_chart(&state, granularity, filter).await?;
    Ok(Json(series))
}

pub async fn modcod(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Series<Sample>>>, Error> {
    Ok(Json(charts::modcod_chart(&state).await?))
}

/// Seconds since the daemon's last heartbeat, as a bare integer.
pub async fn check_watchdog(State(state): State<Arc<AppState>>) -> Result<String, Error> {
    let heartbeat = state.store.watchdog()?;
    Ok(watchdog::age_secs(Utc::now(), heartbeat).to_string())
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    last_heartbeat: String,
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HeartbeatResponse>, Error> {
    let now = Utc::now();
    state.store.touch_watchdog(now)?;
    Ok(Json(HeartbeatResponse {
        last_heartbeat: now.to_rfc3339(),
    }))
}

#[derive(Deserialize)]
pub struct SddRequest {
    rx: String,
    ns: String,
    esno: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ModcodRequest {
    arr: Vec<f64>,
    #[serde(default)]
    bit_rate: f64,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct RecordResponse {
    status: String,
    timestamp: String,
}

fn recorded(timestamp: DateTime<Utc>) -> (StatusCode, Json<RecordResponse>) {
    (
        StatusCode::CREATED,
        Json(RecordResponse {
            status: "recorded".to_owned(),
            timestamp: timestamp.to_rfc3339(),
        }),
    )
}

pub async fn record_sdd(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SddRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), Error> {
    let ts = data.timestamp.unwrap_or_else(Utc::now);
    debug!(rx = %data.rx, ns = %data.ns, esno = data.esno, "recording esno reading");
    state.store.insert_sdd(SddRecord {
        ts,
        rx: data.rx,
        ns: data.ns,
        esno: data.esno,
    })?;
    Ok(recorded(ts))
}

pub async fn record_modcod(
    State(state): State<Arc<AppState>>,
    Json(data): Json<ModcodRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), Error> {
    let expected = state.charts.modcods.len();
    if data.arr.len() != expected {
        return Err(Error::InvalidRecord {
            expected,
            found: data.arr.len(),
        });
    }
    let ts = data.timestamp.unwrap_or_else(Utc::now);
    state.store.insert_mc(McRecord {
        ts,
        bit_rate: data.bit_rate,
        total: data.total,
        arr: data.arr,
    })?;
    Ok(recorded(ts))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::chart_config;
    use crate::store::MemoryStore;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            chart_config::load(None).unwrap(),
            Duration::from_secs(5),
        ))
    }

    fn params(interval: Option<&str>) -> Query<EsnoParams> {
        Query(EsnoParams {
            interval: interval.map(str::to_owned),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn unknown_interval_is_rejected() {
        let result = esno(State(state()), params(Some("fortnight"))).await;
        assert!(matches!(result, Err(Error::InvalidGranularity(name)) if name == "fortnight"));
    }

    #[tokio::test]
    async fn missing_interval_is_rejected() {
        let result = esno(State(state()), params(None)).await;
        assert!(matches!(result, Err(Error::InvalidGranularity(_))));
    }

    #[tokio::test]
    async fn ingested_readings_come_back_averaged() {
        let state = state();
        let t0 = Utc.with_ymd_and_hms(2016, 3, 14, 9, 20, 0).unwrap();
        for (secs, esno) in [(0, 5.0), (30, 7.0), (90, 9.0)] {
            let request = SddRequest {
                rx: "RX1".into(),
                ns: "Zurich".into(),
                esno,
                timestamp: Some(t0 + chrono::Duration::seconds(secs)),
            };
            let (status, _) = record_sdd(State(Arc::clone(&state)), Json(request))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let Json(series) = esno(State(state), params(Some("minute"))).await.unwrap();
        assert_eq!(series.len(), 1);
        let ys: Vec<Option<f64>> = series[0].values.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(6.0), Some(9.0)]);
    }

    #[tokio::test]
    async fn modcod_records_must_match_the_table() {
        let state = state();
        let short = ModcodRequest {
            arr: vec![1.0; 3],
            bit_rate: 0.0,
            total: 0,
            timestamp: None,
        };
        let result = record_modcod(State(Arc::clone(&state)), Json(short)).await;
        assert!(matches!(
            result,
            Err(Error::InvalidRecord {
                expected: 28,
                found: 3
            })
        ));

        let full = ModcodRequest {
            arr: vec![0.5; 28],
            bit_rate: 42.0,
            total: 9,
            timestamp: None,
        };
        let (status, _) = record_modcod(State(Arc::clone(&state)), Json(full))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(series) = modcod(State(state)).await.unwrap();
        assert_eq!(series.len(), 28);
        assert!(series.iter().all(|s| s.values.len() == 1));
    }

    #[tokio::test]
    async fn watchdog_reports_age_after_heartbeat() {
        let state = state();
        assert!(matches!(
            check_watchdog(State(Arc::clone(&state))).await,
            Err(Error::UpstreamUnavailable(_))
        ));

        let Json(beat) = heartbeat(State(Arc::clone(&state))).await.unwrap();
        assert!(DateTime::parse_from_rfc3339(&beat.last_heartbeat).is_ok());
        let age: i64 = check_watchdog(State(state)).await.unwrap().parse().unwrap();
        assert!((0..=1).contains(&age));
    }
}
