use statsview::viewer::{gc_num, heap_memory};
use statsview::{MemStats, StatsMgr, StatsSource, Viewer, ViewerRegistry};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hands out a fixed list of snapshots, one per capture.
struct ScriptedSource {
    script: Mutex<Vec<MemStats>>,
}

impl ScriptedSource {
    fn new(mut snapshots: Vec<MemStats>) -> Arc<Self> {
        snapshots.reverse();
        Arc::new(Self {
            script: Mutex::new(snapshots),
        })
    }
}

impl StatsSource for ScriptedSource {
    fn capture(&self) -> statsview::stats::Result<MemStats> {
        self.script
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| statsview::StatsError::Capture("script exhausted".to_string()))
    }
}

fn gc_stats(num_gc: u64, num_forced_gc: u64) -> MemStats {
    MemStats {
        num_gc,
        num_forced_gc,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_gcnum_follows_successive_snapshots() {
    let s1 = gc_stats(10, 2);
    let s2 = gc_stats(14, 3);
    let mgr = Arc::new(StatsMgr::new(
        ScriptedSource::new(vec![s1.clone(), s2.clone()]),
        Duration::from_secs(1),
    ));
    let viewer = gc_num().with_stats_mgr(Arc::clone(&mgr));

    mgr.tick().await.unwrap();
    let first = viewer.serve().await.unwrap();
    assert_eq!(first.values, vec![s1.num_gc as f64, s1.num_forced_gc as f64]);

    tokio::time::advance(Duration::from_millis(1100)).await;

    mgr.tick().await.unwrap();
    let second = viewer.serve().await.unwrap();
    assert_eq!(second.values, vec![s2.num_gc as f64, s2.num_forced_gc as f64]);
    assert_eq!(mgr.snapshot().await.unwrap().generation, 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_source_serves_error_but_keeps_snapshot() {
    let mgr = Arc::new(StatsMgr::new(
        ScriptedSource::new(vec![gc_stats(1, 0)]),
        Duration::from_secs(1),
    ));
    let viewer = gc_num().with_stats_mgr(Arc::clone(&mgr));

    assert_eq!(viewer.serve().await.unwrap().values, vec![1.0, 0.0]);

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(viewer.serve().await.is_err());

    let kept = mgr.snapshot().await.unwrap();
    assert_eq!(kept.stats.num_gc, 1);
    assert_eq!(kept.generation, 1);
}

#[tokio::test(start_paused = true)]
async fn test_registry_viewers_see_the_same_window() {
    let mgr = Arc::new(StatsMgr::new(
        ScriptedSource::new(vec![
            MemStats {
                heap_alloc: 2_097_152,
                num_gc: 5,
                ..Default::default()
            },
            MemStats::default(),
        ]),
        Duration::from_secs(1),
    ));
    let mut registry = ViewerRegistry::new(Arc::clone(&mgr));
    registry.register(gc_num());
    registry.register(heap_memory());

    let gc = registry.get("gcnum").unwrap().serve().await.unwrap();
    let heap = registry.get("heap memory").unwrap().serve().await.unwrap();

    assert_eq!(gc.time, heap.time);
    assert_eq!(gc.values, vec![5.0, 0.0]);
    assert_eq!(heap.values[0], 2.0);
    assert_eq!(mgr.snapshot().await.unwrap().generation, 1);
}
