use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

/// Failures surfaced by the chart and ingestion endpoints.
///
/// An empty chart is not an error: pipelines return an empty series list (or
/// series with no points) and that serializes as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported granularity {0:?}")]
    InvalidGranularity(String),

    #[error("record store unavailable: {0}")]
    UpstreamUnavailable(#[from] StoreError),

    #[error("aggregation did not finish within {0:?}")]
    Timeout(Duration),

    /// A stored record disagrees with the configured category table.
    #[error("stored record carries {found} categories, table defines {expected}")]
    MalformedRecord { expected: usize, found: usize },

    /// An ingested record disagrees with the configured category table.
    #[error("record carries {found} categories, table defines {expected}")]
    InvalidRecord { expected: usize, found: usize },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidGranularity(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::MalformedRecord { .. } => StatusCode::BAD_GATEWAY,
            Error::InvalidRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            Error::InvalidGranularity("fortnight".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::UpstreamUnavailable(StoreError::Poisoned).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::InvalidRecord {
                expected: 28,
                found: 3
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn message_names_the_bad_input() {
        let msg = Error::InvalidGranularity("fortnight".into()).to_string();
        assert_eq!(msg, "unsupported granularity \"fortnight\"");
    }
}
