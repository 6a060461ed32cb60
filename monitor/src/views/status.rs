use std::sync::Arc;

use axum::extract::{Query, State};
use chrono::Utc;
use maud::{Markup, html};
use serde::Deserialize;

use crate::charts::{self, bucket::Granularity, svg};
use crate::error::Error;
use crate::records::LinkFilter;
use crate::state::AppState;
use crate::store::StoreError;
use crate::watchdog;

use super::page_shell;

/// Interval shown when the page is opened without `?interval=`.
const DEFAULT_INTERVAL: Granularity = Granularity::TenMinutes;

#[derive(Deserialize, Default)]
pub struct IndexQuery {
    interval: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Result<Markup, Error> {
    let granularity = match query.interval.as_deref() {
        Some(name) => name.parse()?,
        None => DEFAULT_INTERVAL,
    };

    let heartbeat_age = match state.store.watchdog() {
        Ok(ts) => Some(watchdog::age_secs(Utc::now(), ts)),
        Err(StoreError::NoHeartbeat) => None,
        Err(e) => return Err(e.into()),
    };
    let newest = state.store.scan_sdd(1, &LinkFilter::default())?.next().map(|r| r.ts);
    let series = charts::esno_chart(&state, granularity, LinkFilter::default()).await?;

    let content = html! {
        nav {
            div.meta {
                @match heartbeat_age {
                    Some(age) if watchdog::is_healthy(age) => {
                        span.status-ok { "Server status: [OK]" }
                    }
                    Some(age) => {
                        span.status-down { "Server status: [DOWN " (age) "s]" }
                    }
                    None => {
                        span.status-down { "Server status: [NO HEARTBEAT]" }
                    }
                }
                span {
                    "Newest data: "
                    @match newest {
                        Some(ts) => {
                            (ts.format("%a, %d %b %Y, %H:%M").to_string())
                        }
                        None => {
                            "none"
                        }
                    }
                }
            }
            div.interval-selector {
                @for g in Granularity::ALL {
                    a.active[g == granularity] href=(format!("/?interval={}", g.as_str())) {
                        (g.display_name())
                    }
                }
            }
        }
        main {
            (svg::render_line_chart(&series, "Es/N0"))
        }
    };
    Ok(page_shell("Satellite Connection Monitor", content))
}
