//! Stats source backed by the current process.
//!
//! Combines three views of memory, each optional depending on platform:
//! - [`CountingAllocator`] counters for live heap bytes and objects
//! - glibc `mallinfo2` for arena sizes (Linux/gnu only)
//! - `/proc/self/status` for stack and page-table sizes (Linux only)
//!
//! Heap trims stand in for collection cycles: `num_gc` counts every trim,
//! `num_forced_gc` only the ones requested through [`MemoryReclaimer`].

use crate::stats::allocator::CountingAllocator;
use crate::stats::source::{MemoryReclaimer, Result, StatsError, StatsSource};
use crate::stats::types::MemStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Memory fields parsed from `/proc/self/status`, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub vm_data: u64,
    pub vm_stk: u64,
    pub vm_pte: u64,
}

/// Parses the `VmData`, `VmStk` and `VmPTE` lines of a
/// `/proc/<pid>/status` document. Missing lines are left at zero; a line
/// that is present but unparsable is an error.
pub fn parse_proc_status(contents: &str) -> Result<ProcStatus> {
    let mut status = ProcStatus::default();

    for line in contents.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "VmData" => &mut status.vm_data,
            "VmStk" => &mut status.vm_stk,
            "VmPTE" => &mut status.vm_pte,
            _ => continue,
        };
        *slot = parse_kb_value(value).ok_or_else(|| StatsError::Parse {
            field: key.trim().to_string(),
        })?;
    }

    Ok(status)
}

/// `"   1234 kB"` -> `1234 * 1024`
fn parse_kb_value(value: &str) -> Option<u64> {
    let mut parts = value.split_whitespace();
    let number: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") | None => Some(number * 1024),
        Some(_) => None,
    }
}

/// Glibc arena figures, in bytes.
#[derive(Debug, Clone, Copy, Default)]
struct ArenaInfo {
    arena: u64,
    mmapped: u64,
    in_use: u64,
    free: u64,
    releasable: u64,
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn arena_info() -> Option<ArenaInfo> {
    // SAFETY: mallinfo2 only reads allocator bookkeeping and has no preconditions.
    let info = unsafe { libc::mallinfo2() };
    Some(ArenaInfo {
        arena: info.arena as u64,
        mmapped: info.hblkhd as u64,
        in_use: info.uordblks as u64,
        free: info.fordblks as u64,
        releasable: info.keepcost as u64,
    })
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn arena_info() -> Option<ArenaInfo> {
    None
}

#[cfg(target_os = "linux")]
fn read_proc_status() -> Result<ProcStatus> {
    let contents = std::fs::read_to_string("/proc/self/status")?;
    parse_proc_status(&contents)
}

#[cfg(not(target_os = "linux"))]
fn read_proc_status() -> Result<ProcStatus> {
    Ok(ProcStatus::default())
}

#[cfg(unix)]
fn stack_limit() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `limit` is a valid, writable rlimit struct.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_STACK, &mut limit) };
    if rc != 0 || limit.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    Some(limit.rlim_cur as u64)
}

#[cfg(not(unix))]
fn stack_limit() -> Option<u64> {
    None
}

/// Returns free heap pages to the OS. Returns whether anything was released.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn trim_heap() -> bool {
    // SAFETY: malloc_trim is safe to call at any time from any thread.
    unsafe { libc::malloc_trim(0) == 1 }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn trim_heap() -> bool {
    false
}

/// [`StatsSource`] reading the memory state of the running process.
pub struct ProcessStatsSource {
    allocator: Option<&'static CountingAllocator>,
    cycles: AtomicU64,
    forced: AtomicU64,
}

impl ProcessStatsSource {
    pub fn new() -> Self {
        Self {
            allocator: None,
            cycles: AtomicU64::new(0),
            forced: AtomicU64::new(0),
        }
    }

    /// Use the counters of an installed global [`CountingAllocator`].
    pub fn with_allocator(mut self, allocator: &'static CountingAllocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    fn trim(&self, forced: bool) -> bool {
        let released = trim_heap();
        let cycles = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        if forced {
            self.forced.fetch_add(1, Ordering::Relaxed);
        }
        debug!(cycles, forced, released, "trimmed heap");
        released
    }

    /// Trims the heap every `every` until the runtime shuts down.
    /// The first trim happens one period after the call.
    pub fn spawn_reclaimer(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.trim(false);
            }
        })
    }

    fn assemble(
        &self,
        status: ProcStatus,
        arena: Option<ArenaInfo>,
        stack_limit: Option<u64>,
    ) -> MemStats {
        let counted = self.allocator.map(|a| a.stats());

        let heap_alloc = match (counted, arena) {
            (Some(c), _) => c.live_bytes,
            (None, Some(a)) => a.in_use,
            (None, None) => 0,
        };
        let (heap_inuse, heap_sys) = match arena {
            Some(a) => (a.in_use + a.mmapped, a.arena + a.mmapped),
            None => (heap_alloc, status.vm_data),
        };
        let (heap_idle, heap_released) = match arena {
            Some(a) => (a.free, a.releasable),
            None => (heap_sys.saturating_sub(heap_inuse), 0),
        };
        let stack_sys = stack_limit
            .filter(|limit| *limit >= status.vm_stk)
            .unwrap_or(status.vm_stk);

        MemStats {
            heap_alloc,
            heap_inuse,
            heap_sys,
            heap_idle,
            heap_released,
            heap_objects: counted.map_or(0, |c| c.live_objects),
            stack_inuse: status.vm_stk,
            stack_sys,
            mspan_inuse: status.vm_pte,
            mspan_sys: status.vm_pte,
            mcache_inuse: 0,
            mcache_sys: 0,
            num_gc: self.cycles.load(Ordering::Relaxed),
            num_forced_gc: self.forced.load(Ordering::Relaxed),
        }
    }
}

impl Default for ProcessStatsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSource for ProcessStatsSource {
    fn capture(&self) -> Result<MemStats> {
        let status = read_proc_status()?;
        Ok(self.assemble(status, arena_info(), stack_limit()))
    }
}

impl MemoryReclaimer for ProcessStatsSource {
    fn release_memory(&self) -> bool {
        self.trim(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "\
Name:\tstatsview
Umask:\t0022
State:\tS (sleeping)
VmPeak:\t  123456 kB
VmData:\t    2048 kB
VmStk:\t     132 kB
VmRSS:\t    8192 kB
VmPTE:\t      64 kB
Threads:\t4
";

    #[test]
    fn test_parse_proc_status() {
        let status = parse_proc_status(STATUS).unwrap();
        assert_eq!(status.vm_data, 2048 * 1024);
        assert_eq!(status.vm_stk, 132 * 1024);
        assert_eq!(status.vm_pte, 64 * 1024);
    }

    #[test]
    fn test_parse_proc_status_missing_fields() {
        let status = parse_proc_status("Name:\tkthreadd\nState:\tS (sleeping)\n").unwrap();
        assert_eq!(status, ProcStatus::default());
    }

    #[test]
    fn test_parse_proc_status_malformed_field() {
        let err = parse_proc_status("VmStk:\t lots kB\n").unwrap_err();
        assert!(matches!(err, StatsError::Parse { ref field } if field == "VmStk"));
    }

    #[test]
    fn test_assemble_with_arena() {
        let source = ProcessStatsSource::new();
        let status = ProcStatus {
            vm_data: 10_000,
            vm_stk: 4096,
            vm_pte: 512,
        };
        let arena = ArenaInfo {
            arena: 1000,
            mmapped: 200,
            in_use: 600,
            free: 400,
            releasable: 100,
        };

        let stats = source.assemble(status, Some(arena), Some(8 * 1024 * 1024));
        assert_eq!(stats.heap_alloc, 600);
        assert_eq!(stats.heap_inuse, 800);
        assert_eq!(stats.heap_sys, 1200);
        assert_eq!(stats.heap_idle, 400);
        assert_eq!(stats.heap_released, 100);
        assert_eq!(stats.stack_inuse, 4096);
        assert_eq!(stats.stack_sys, 8 * 1024 * 1024);
        assert_eq!(stats.mspan_inuse, 512);
        assert_eq!(stats.heap_objects, 0);
    }

    #[test]
    fn test_assemble_without_arena() {
        let source = ProcessStatsSource::new();
        let status = ProcStatus {
            vm_data: 10_000,
            vm_stk: 4096,
            vm_pte: 0,
        };

        let stats = source.assemble(status, None, None);
        assert_eq!(stats.heap_alloc, 0);
        assert_eq!(stats.heap_sys, 10_000);
        assert_eq!(stats.heap_idle, 10_000);
        assert_eq!(stats.stack_sys, 4096);
    }

    #[test]
    fn test_assemble_prefers_allocator_counters() {
        static ALLOC: CountingAllocator = CountingAllocator::new();
        let source = ProcessStatsSource::new().with_allocator(&ALLOC);

        let stats = source.assemble(ProcStatus::default(), None, None);
        assert_eq!(stats.heap_alloc, ALLOC.stats().live_bytes);
        assert_eq!(stats.heap_objects, ALLOC.stats().live_objects);
    }

    #[test]
    fn test_release_memory_counts_forced_cycles() {
        let source = ProcessStatsSource::new();
        source.release_memory();
        source.release_memory();
        source.trim(false);

        let stats = source.assemble(ProcStatus::default(), None, None);
        assert_eq!(stats.num_gc, 3);
        assert_eq!(stats.num_forced_gc, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaimer_trims_periodically() {
        let source = Arc::new(ProcessStatsSource::new());
        let handle = Arc::clone(&source).spawn_reclaimer(Duration::from_secs(1));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(source.cycles.load(Ordering::Relaxed), 0);

        time::sleep(Duration::from_secs(3)).await;
        let stats = source.assemble(ProcStatus::default(), None, None);
        assert_eq!(stats.num_gc, 3);
        assert_eq!(stats.num_forced_gc, 0);

        handle.abort();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_capture_reads_live_process() {
        let stats = ProcessStatsSource::new().capture().unwrap();
        assert!(stats.stack_inuse > 0);
    }
}
