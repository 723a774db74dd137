use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid time format '{0}'")]
    InvalidTimeFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole dashboard backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub server: ServerConfig,
    pub chart: ChartConfig,
    pub viewers: ViewersConfig,
    pub reclaim: ReclaimConfig,
}

/// How often runtime stats may be re-captured, and how capture times are labelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Minimum time between two real captures, in milliseconds
    pub interval_ms: u64,
    /// `chrono` strftime format for the `Time` field of served samples
    pub time_format: String,
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Rejects formats chrono cannot render, such as unknown `%` specifiers.
    pub fn validate(&self) -> Result<()> {
        let invalid = StrftimeItems::new(&self.time_format)
            .any(|item| matches!(item, Item::Error));
        if invalid {
            return Err(ConfigError::InvalidTimeFormat(self.time_format.clone()));
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Path prefix every route is mounted under
    pub route_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "localhost:18066".to_string(),
            route_prefix: "/debug/statsview".to_string(),
        }
    }
}

/// Presentation settings passed through to the charting frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Number of points a chart keeps before dropping the oldest
    pub max_points: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { max_points: 30 }
    }
}

/// Which viewers get registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewersConfig {
    /// Viewer names to enable. Empty means all of them.
    pub enabled: Vec<String>,
}

/// Periodic heap trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    /// Time between background trims, in milliseconds. 0 disables them.
    pub interval_ms: u64,
}

impl ReclaimConfig {
    /// `None` when background trimming is disabled.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self { interval_ms: 60_000 }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.sampler.validate()?;
        Ok(config)
    }

    /// Load configuration from `statsview.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        match Self::load("statsview.yaml") {
            Ok(config) => config,
            Err(ConfigError::FileRead(e)) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("Ignoring statsview.yaml, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum interval between captures.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.sampler.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the strftime format used for sample timestamps.
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.sampler.time_format = format.into();
        self
    }

    /// Set the address the HTTP server binds to.
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.server.listen_addr = addr.into();
        self
    }

    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.server.route_prefix = prefix.into();
        self
    }

    /// Set the background trim interval. `Duration::ZERO` disables it.
    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.chart.max_points = max_points;
        self
    }

    /// Restrict registration to the named viewers.
    pub fn with_viewers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.viewers.enabled = names.into_iter().map(Into::into).collect();
        self
    }
}
