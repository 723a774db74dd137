//! Chart viewers projecting the shared stats snapshot into series values.
//!
//! - `chart`: static presentation settings handed to the charting frontend
//! - `metric`: the generic viewer driven by a declarative series list
//! - `families`: the built-in viewers (heap, objects, stack, off-heap, GC)
//! - `registry`: name-keyed collection used for routing

mod chart;
mod families;
mod metric;
mod registry;

pub use chart::{AxisSpec, ChartSpec, DataZoomSpec};
pub use families::{
    default_viewers, gc_num, heap_memory, heap_objects, off_heap_memory, stack_memory,
    viewer_by_name, VGCNUM, VHEAP, VHEAP_OBJECTS, VOFF_HEAP, VSTACK,
};
pub use metric::{to_megabytes, MetricViewer, Series, Unit};
pub use registry::ViewerRegistry;

use crate::stats::{StatsError, StatsMgr};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Viewer '{name}' has no stats manager")]
    Unwired { name: String },

    #[error("No stats snapshot available")]
    NoSnapshot,

    #[error(transparent)]
    Stats(#[from] StatsError),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

/// One sample of a chart: the values of every series, in declared order,
/// plus the label of the capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    #[serde(rename = "Values")]
    pub values: Vec<f64>,
    #[serde(rename = "Time")]
    pub time: String,
}

/// A named chart fed from the shared [`StatsMgr`].
#[async_trait]
pub trait Viewer: Send + Sync {
    /// Stable identifier used for routing and registry lookup.
    fn name(&self) -> &str;

    /// Injects the shared stats manager.
    fn set_stats_mgr(&mut self, mgr: Arc<StatsMgr>);

    /// Static chart configuration.
    fn chart(&self) -> &ChartSpec;

    /// Ticks the stats manager and projects the current snapshot.
    ///
    /// Each call triggers at most one capture on the underlying source.
    async fn serve(&self) -> Result<SamplePoint>;
}
