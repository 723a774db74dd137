mod allocator;
mod manager;
mod process;
mod source;
mod types;

pub use allocator::CountingAllocator;
pub use manager::StatsMgr;
pub use process::{parse_proc_status, ProcStatus, ProcessStatsSource};
pub use source::{MemoryReclaimer, Result, StatsError, StatsSource};
pub use types::{AllocatorStats, MemStats, TimestampedSnapshot};
