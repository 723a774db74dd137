use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One consistent point-in-time capture of the process memory counters.
///
/// All values are raw byte or event counts. Conversion to display units is
/// left to the viewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemStats {
    pub heap_alloc: u64,
    pub heap_inuse: u64,
    pub heap_sys: u64,
    pub heap_idle: u64,
    pub heap_released: u64,
    pub heap_objects: u64,
    pub stack_inuse: u64,
    pub stack_sys: u64,
    pub mspan_inuse: u64,
    pub mspan_sys: u64,
    pub mcache_inuse: u64,
    pub mcache_sys: u64,
    pub num_gc: u64,
    pub num_forced_gc: u64,
}

/// A [`MemStats`] paired with the moment it was captured.
///
/// Instances are only ever created by the stats manager and handed out
/// behind an `Arc`, so every reader inside one sampling window holds the
/// very same value.
#[derive(Debug, Clone)]
pub struct TimestampedSnapshot {
    pub stats: MemStats,
    /// Monotonic capture instant, used for throttling.
    pub captured_at: Instant,
    /// Wall-clock capture time, used for the labels sent to clients.
    pub wall_time: DateTime<Local>,
    /// 1-based count of successful captures up to and including this one.
    pub generation: u64,
}

/// Live-allocation counters kept by [`CountingAllocator`](super::CountingAllocator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStats {
    pub live_bytes: u64,
    pub live_objects: u64,
    pub total_allocs: u64,
    pub total_frees: u64,
}
