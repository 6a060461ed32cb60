use std::sync::Arc;

use chrono::Utc;
use tracing::error;

use crate::config::{DATA_RETENTION, PRUNE_INTERVAL};
use crate::state::AppState;

pub fn spawn_background_workers(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;

            // Prune old data
            let cutoff = Utc::now() - DATA_RETENTION;
            if let Err(e) = state.store.prune(cutoff) {
                error!("failed to prune record store: {e}");
            }
        }
    });
}
