use crate::config::SamplerConfig;
use crate::stats::source::{Result, StatsError, StatsSource};
use crate::stats::types::TimestampedSnapshot;
use chrono::Local;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Throttled owner of the shared stats snapshot.
///
/// Every viewer calls [`tick`](Self::tick) before reading, but the
/// underlying [`StatsSource`] is only consulted once per `min_interval`.
/// Concurrent bursts inside one window collapse into a single capture and
/// all of them read the same `Arc<TimestampedSnapshot>` afterwards.
///
/// There is no background poller: when nobody asks for stats, nothing is
/// captured.
pub struct StatsMgr {
    source: Arc<dyn StatsSource>,
    min_interval: Duration,
    time_format: String,
    current: Mutex<Option<Arc<TimestampedSnapshot>>>,
}

impl StatsMgr {
    pub fn new(source: Arc<dyn StatsSource>, min_interval: Duration) -> Self {
        Self {
            source,
            min_interval,
            time_format: SamplerConfig::default().time_format,
            current: Mutex::new(None),
        }
    }

    pub fn from_config(source: Arc<dyn StatsSource>, config: &SamplerConfig) -> Self {
        Self {
            source,
            min_interval: config.interval(),
            time_format: config.time_format.clone(),
            current: Mutex::new(None),
        }
    }

    /// Refreshes the shared snapshot if the current one is older than
    /// `min_interval` (or missing).
    ///
    /// The staleness check, the capture and the store happen under one lock.
    ///
    /// # Errors
    ///
    /// Returns the source's error if a due capture fails. The previously
    /// stored snapshot is kept as is.
    pub async fn tick(&self) -> Result<()> {
        let mut current = self.current.lock().await;
        let now = Instant::now();

        if let Some(snapshot) = current.as_ref() {
            let elapsed = now.saturating_duration_since(snapshot.captured_at);
            if elapsed < self.min_interval {
                trace!(generation = snapshot.generation, ?elapsed, "reusing stats snapshot");
                return Ok(());
            }
        }

        let stats = self.source.capture().map_err(|e| {
            warn!("Failed to capture runtime stats: {}", e);
            e
        })?;
        let generation = current.as_ref().map_or(1, |s| s.generation + 1);

        *current = Some(Arc::new(TimestampedSnapshot {
            stats,
            captured_at: now,
            wall_time: Local::now(),
            generation,
        }));
        debug!(generation, "captured runtime stats");

        Ok(())
    }

    /// The current snapshot, without refreshing it.
    pub async fn snapshot(&self) -> Option<Arc<TimestampedSnapshot>> {
        self.current.lock().await.clone()
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }

    /// Renders the wall-clock capture time with the configured format.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::TimeFormat`] if the format contains an unknown
    /// specifier.
    pub fn format_time(&self, snapshot: &TimestampedSnapshot) -> Result<String> {
        let mut label = String::new();
        write!(label, "{}", snapshot.wall_time.format(&self.time_format)).map_err(|_| {
            StatsError::TimeFormat {
                format: self.time_format.clone(),
            }
        })?;
        Ok(label)
    }
}
