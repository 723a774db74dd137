use super::{ChartSpec, Result, SamplePoint, Viewer, ViewerError};
use crate::stats::{MemStats, StatsMgr};
use async_trait::async_trait;
use std::sync::Arc;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a byte count to megabytes, rounded to two decimals.
pub fn to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Display unit of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Plain count, served unchanged
    Count,
    /// Bytes, served as MB with two decimals
    Megabytes,
}

impl Unit {
    pub fn convert(self, raw: u64) -> f64 {
        match self {
            Unit::Count => raw as f64,
            Unit::Megabytes => to_megabytes(raw),
        }
    }
}

/// One chart series: its display name and where its value comes from.
#[derive(Debug, Clone, Copy)]
pub struct Series {
    pub name: &'static str,
    pub field: fn(&MemStats) -> u64,
    pub unit: Unit,
}

impl Series {
    pub const fn count(name: &'static str, field: fn(&MemStats) -> u64) -> Self {
        Self {
            name,
            field,
            unit: Unit::Count,
        }
    }

    pub const fn megabytes(name: &'static str, field: fn(&MemStats) -> u64) -> Self {
        Self {
            name,
            field,
            unit: Unit::Megabytes,
        }
    }

    pub fn value(&self, stats: &MemStats) -> f64 {
        self.unit.convert((self.field)(stats))
    }
}

/// Viewer defined entirely by its series list.
///
/// The chart's series names are taken from the same list the values are
/// projected from, so the two can never drift apart.
pub struct MetricViewer {
    name: String,
    chart: ChartSpec,
    series: Vec<Series>,
    mgr: Option<Arc<StatsMgr>>,
}

impl MetricViewer {
    pub fn new(name: impl Into<String>, chart: ChartSpec, series: Vec<Series>) -> Self {
        let chart = chart.with_series(series.iter().map(|s| s.name));
        Self {
            name: name.into(),
            chart,
            series,
            mgr: None,
        }
    }

    pub fn with_stats_mgr(mut self, mgr: Arc<StatsMgr>) -> Self {
        self.mgr = Some(mgr);
        self
    }

    pub fn with_chart_max_points(mut self, max_points: usize) -> Self {
        self.chart = self.chart.with_max_points(max_points);
        self
    }

    /// Values of every series for `stats`, in declared order.
    pub fn project(&self, stats: &MemStats) -> Vec<f64> {
        self.series.iter().map(|s| s.value(stats)).collect()
    }
}

#[async_trait]
impl Viewer for MetricViewer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_stats_mgr(&mut self, mgr: Arc<StatsMgr>) {
        self.mgr = Some(mgr);
    }

    fn chart(&self) -> &ChartSpec {
        &self.chart
    }

    async fn serve(&self) -> Result<SamplePoint> {
        let mgr = self.mgr.as_ref().ok_or_else(|| ViewerError::Unwired {
            name: self.name.clone(),
        })?;

        mgr.tick().await?;
        let snapshot = mgr.snapshot().await.ok_or(ViewerError::NoSnapshot)?;

        Ok(SamplePoint {
            values: self.project(&snapshot.stats),
            time: mgr.format_time(&snapshot)?,
        })
    }
}
