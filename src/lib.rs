//! statsview - Throttled runtime memory charts over HTTP
//!
//! Re-exports the sampling core and the HTTP server, and offers
//! [`build_server`] to wire them together from a [`Config`].
//!
//! ```ignore
//! use statsview::{build_server, Config, CountingAllocator, ProcessStatsSource};
//!
//! #[global_allocator]
//! static ALLOC: CountingAllocator = CountingAllocator::new();
//!
//! let source = Arc::new(ProcessStatsSource::new().with_allocator(&ALLOC));
//! build_server(&Config::load_or_default(), source).start().await?;
//! ```

pub use statsview_core::*;
pub use statsview_server::{base_url, ApiError, ReleaseReport, Server, ServerError};

use std::sync::Arc;

/// Creates the stats manager, registers the enabled viewers and wraps them
/// in a [`Server`].
pub fn build_server(config: &Config, source: Arc<dyn StatsSource>) -> Server {
    let mgr = Arc::new(StatsMgr::from_config(source, &config.sampler));
    let registry = ViewerRegistry::from_config(&config.viewers, &config.chart, mgr);
    Server::new(config.server.clone(), registry)
}
