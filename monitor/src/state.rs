use std::sync::Arc;
use std::time::Duration;

use crate::chart_config::ChartConfig;
use crate::store::RecordStore;

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub charts: ChartConfig,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        charts: ChartConfig,
        request_timeout: Duration,
    ) -> Self {
        AppState {
            store,
            charts,
            request_timeout,
        }
    }
}
