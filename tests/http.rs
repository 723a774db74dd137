use statsview::{base_url, build_server, Config, MemStats, StatsSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

struct CountingSource {
    captures: AtomicU64,
}

impl StatsSource for CountingSource {
    fn capture(&self) -> statsview::stats::Result<MemStats> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MemStats {
            heap_objects: n,
            stack_inuse: 1024 * 1024,
            stack_sys: 8 * 1024 * 1024,
            ..Default::default()
        })
    }
}

async fn get_json(url: String) -> anyhow::Result<serde_json::Value> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_charts_polled_together_share_one_capture() -> anyhow::Result<()> {
    let config = Config::new()
        .with_interval(Duration::from_secs(30))
        .with_viewers(["heap objects", "stack memory"]);
    let source = Arc::new(CountingSource {
        captures: AtomicU64::new(0),
    });
    let server = build_server(&config, source.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = base_url(listener.local_addr()?, &config.server);
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { server.serve(listener, token).await });

    let (objects, stack) = tokio::join!(
        get_json(format!("{}/view/heap%20objects", url)),
        get_json(format!("{}/view/stack%20memory", url)),
    );
    let (objects, stack) = (objects?, stack?);

    assert_eq!(objects["Values"], serde_json::json!([1.0]));
    assert_eq!(stack["Values"], serde_json::json!([8.0, 1.0]));
    assert_eq!(objects["Time"], stack["Time"]);
    assert_eq!(source.captures.load(Ordering::SeqCst), 1);

    let again = get_json(format!("{}/view/heap%20objects", url)).await?;
    assert_eq!(again, objects);

    // Disabled by config.
    let status = reqwest::get(format!("{}/view/gcnum", url)).await?.status();
    assert_eq!(status, 404);

    shutdown.cancel();
    handle.await??;
    Ok(())
}
