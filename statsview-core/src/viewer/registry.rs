use super::{families, Viewer};
use crate::config::{ChartConfig, ViewersConfig};
use crate::stats::StatsMgr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry of viewers sharing one [`StatsMgr`].
///
/// The registry is responsible for:
/// - Wiring the shared manager into every registered viewer
/// - Rejecting duplicate names
/// - Looking up viewers by name, in registration order
pub struct ViewerRegistry {
    mgr: Arc<StatsMgr>,
    viewers: Vec<Arc<dyn Viewer>>,
}

impl ViewerRegistry {
    pub fn new(mgr: Arc<StatsMgr>) -> Self {
        Self {
            mgr,
            viewers: Vec::new(),
        }
    }

    /// Builds a registry holding the built-in viewers enabled by `config`.
    ///
    /// An empty `enabled` list registers all of them. Unknown names are
    /// skipped.
    pub fn from_config(
        config: &ViewersConfig,
        chart: &ChartConfig,
        mgr: Arc<StatsMgr>,
    ) -> Self {
        let mut registry = Self::new(mgr);

        let selected = if config.enabled.is_empty() {
            families::default_viewers()
        } else {
            config
                .enabled
                .iter()
                .filter_map(|name| {
                    let viewer = families::viewer_by_name(name);
                    if viewer.is_none() {
                        warn!("Unknown viewer '{}' in config, skipping", name);
                    }
                    viewer
                })
                .collect()
        };

        for viewer in selected {
            let viewer = viewer.with_chart_max_points(chart.max_points);
            registry.register(viewer);
        }

        registry
    }

    /// Register a viewer, injecting the shared stats manager.
    /// Returns false if a viewer with the same name already exists.
    pub fn register<V: Viewer + 'static>(&mut self, mut viewer: V) -> bool {
        if self.get(viewer.name()).is_some() {
            warn!("Viewer '{}' is already registered", viewer.name());
            return false;
        }

        viewer.set_stats_mgr(Arc::clone(&self.mgr));
        debug!("Registered viewer '{}'", viewer.name());
        self.viewers.push(Arc::new(viewer));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Viewer>> {
        self.viewers.iter().find(|v| v.name() == name)
    }

    pub fn all(&self) -> &[Arc<dyn Viewer>] {
        &self.viewers
    }

    pub fn names(&self) -> Vec<&str> {
        self.viewers.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }
}
