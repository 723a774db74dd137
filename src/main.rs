use anyhow::Context;
use statsview::{build_server, Config, CountingAllocator, ProcessStatsSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load_or_default();
    info!(
        "Sampling every {}ms, serving on {}",
        config.sampler.interval_ms, config.server.listen_addr
    );

    let source = Arc::new(ProcessStatsSource::new().with_allocator(&ALLOC));
    if let Some(every) = config.reclaim.interval() {
        info!("Trimming the heap every {}ms", config.reclaim.interval_ms);
        Arc::clone(&source).spawn_reclaimer(every);
    }
    let server = build_server(&config, source.clone()).with_reclaimer(source);

    server.start().await.context("statsview server failed")?;
    Ok(())
}
