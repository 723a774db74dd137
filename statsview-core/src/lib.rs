//! statsview-core - Runtime memory sampling for self-observability charts
//!
//! Provides the pieces behind a statsview dashboard:
//! - Stats capture (process source, counting global allocator)
//! - A throttled, shared snapshot (`StatsMgr`)
//! - Chart viewers projecting the snapshot into series values
//! - Configuration management
//!
//! ## Primary API
//!
//! Build a [`StatsMgr`] around a [`StatsSource`], then hand it to a
//! [`ViewerRegistry`]. Every viewer's `serve` call goes through the manager,
//! so concurrent charts share one capture per sampling window.

pub mod config;
pub mod stats;
pub mod viewer;

pub use config::{
    ChartConfig, Config, ConfigError, ReclaimConfig, SamplerConfig, ServerConfig, ViewersConfig,
};
pub use stats::{
    CountingAllocator, MemStats, MemoryReclaimer, ProcessStatsSource, StatsError, StatsMgr,
    StatsSource, TimestampedSnapshot,
};
pub use viewer::{
    ChartSpec, MetricViewer, SamplePoint, Series, Unit, Viewer, ViewerError, ViewerRegistry,
};
