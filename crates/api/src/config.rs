//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use stockforge_counting::{CountPolicy, SuggestionWeights};
use stockforge_observability::{LogConfig, LogFormat};

pub const BIND_ADDR: &str = "STOCKFORGE_BIND_ADDR";
pub const DATA_DIR: &str = "STOCKFORGE_DATA_DIR";
pub const LOG_FORMAT: &str = "STOCKFORGE_LOG_FORMAT";
pub const DOUBLE_COUNT_TOLERANCE: &str = "STOCKFORGE_DOUBLE_COUNT_TOLERANCE";
pub const CRITICAL_SECTORS: &str = "STOCKFORGE_CRITICAL_SECTORS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
#[error("invalid {var}: {reason}")]
pub struct ConfigError {
    var: &'static str,
    reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Directory of the JSON collections; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub log: LogConfig,
    pub count_policy: CountPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables take their defaults;
    /// malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let raw_addr = get(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.trim().parse::<SocketAddr>().map_err(|err| ConfigError {
            var: BIND_ADDR,
            reason: format!("{err}"),
        })?;

        let format = match get(LOG_FORMAT) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|err| ConfigError {
                var: LOG_FORMAT,
                reason: err.to_string(),
            })?,
            None => LogFormat::default(),
        };

        let double_count_tolerance = match get(DOUBLE_COUNT_TOLERANCE) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) if value >= 0 => value,
                Ok(_) => {
                    return Err(ConfigError {
                        var: DOUBLE_COUNT_TOLERANCE,
                        reason: "must not be negative".to_string(),
                    });
                }
                Err(err) => {
                    return Err(ConfigError {
                        var: DOUBLE_COUNT_TOLERANCE,
                        reason: err.to_string(),
                    });
                }
            },
            None => 0,
        };

        let critical_sectors = get(CRITICAL_SECTORS)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            data_dir: get(DATA_DIR).map(|dir| PathBuf::from(dir.trim())),
            log: LogConfig {
                format,
                ..LogConfig::default()
            },
            count_policy: CountPolicy {
                double_count_tolerance,
                weights: SuggestionWeights {
                    critical_sectors,
                    ..SuggestionWeights::default()
                },
            },
        })
    }
}
