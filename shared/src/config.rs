use std::{env, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct ServerConfig {
    /// Socket address the HTTP listener binds to
    pub bind_addr: String,
    /// Directory holding the persisted record collections
    pub data_dir: PathBuf,
    /// Upper bound on how long a single chart request may spend aggregating
    pub request_timeout: Duration,
    /// Optional override for the built-in chart configuration (MODCOD table)
    pub chart_config: Option<PathBuf>,
}

impl ServerConfig {
    pub fn load(manifest_dir: &Path) -> Result<Self> {
        #[cfg(debug_assertions)]
        {
            if let Err(e) = dotenvy::from_path(manifest_dir.join(".env")) {
                tracing::debug!("no .env file loaded: {e}");
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = manifest_dir;

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let request_timeout = match var("SCM_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SCM_REQUEST_TIMEOUT_SECS is not a number: {raw:?}"))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        anyhow::ensure!(
            request_timeout > 0,
            "SCM_REQUEST_TIMEOUT_SECS must be at least one second"
        );

        Ok(Self {
            bind_addr: var("SCM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            data_dir: var("SCM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            request_timeout: Duration::from_secs(request_timeout),
            chart_config: var("SCM_CHART_CONFIG")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Load server config using the calling crate's manifest directory.
#[macro_export]
macro_rules! load_server_config {
    () => {
        $crate::config::ServerConfig::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")))
    };
}
