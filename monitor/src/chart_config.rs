use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::charts::aggregate::Representative;

const DEFAULT_CONFIG: &str = include_str!("../charts.toml");

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChartConfig {
    /// MODCOD names in wire order; index `i` labels `arr[i]` of every record.
    pub modcods: Vec<String>,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AggregationConfig {
    #[serde(default)]
    pub representative: Representative,
}

impl ChartConfig {
    pub fn parse(content: &str) -> io::Result<Self> {
        let config: ChartConfig =
            toml::from_str(content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> io::Result<()> {
        if self.modcods.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "MODCOD table must not be empty",
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.modcods {
            if !seen.insert(name.as_str()) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("MODCOD {name:?} listed twice"),
                ));
            }
        }
        Ok(())
    }
}

/// Loads the chart config from `path`, or the built-in one when no path is
/// given. A configured path that doesn't exist falls back to the built-in
/// config; other I/O and parse errors propagate.
pub fn load(path: Option<&Path>) -> io::Result<ChartConfig> {
    let Some(path) = path else {
        return ChartConfig::parse(DEFAULT_CONFIG);
    };
    match fs::read_to_string(path) {
        Ok(content) => {
            let config = ChartConfig::parse(&content)?;
            info!(
                modcods = config.modcods.len(),
                "loaded chart config from {}",
                path.display()
            );
            Ok(config)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("chart config {} not found, using built-in", path.display());
            ChartConfig::parse(DEFAULT_CONFIG)
        }
        Err(e) => Err(e),
    }
}
