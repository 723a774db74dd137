use crate::stats::types::MemStats;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Stats capture failed: {0}")]
    Capture(String),

    #[error("Failed to read process status: {0}")]
    Proc(#[from] std::io::Error),

    #[error("Malformed process status field: {field}")]
    Parse { field: String },

    #[error("Invalid time format: {format}")]
    TimeFormat { format: String },
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Produces fresh [`MemStats`] snapshots on demand.
///
/// Capturing is assumed to be comparatively expensive; callers should go
/// through [`StatsMgr`](super::StatsMgr) rather than invoking it per request.
pub trait StatsSource: Send + Sync {
    fn capture(&self) -> Result<MemStats>;
}

/// Hands free heap memory back to the OS on request.
pub trait MemoryReclaimer: Send + Sync {
    /// Runs one forced reclaim cycle. Returns whether anything was released.
    fn release_memory(&self) -> bool;
}

impl<F> StatsSource for F
where
    F: Fn() -> Result<MemStats> + Send + Sync,
{
    fn capture(&self) -> Result<MemStats> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let source = || -> Result<MemStats> {
            Ok(MemStats {
                num_gc: 7,
                ..Default::default()
            })
        };

        let stats = source.capture().unwrap();
        assert_eq!(stats.num_gc, 7);
    }

    #[test]
    fn test_error_messages() {
        let err = StatsError::Parse {
            field: "VmStk".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed process status field: VmStk");

        let err = StatsError::Capture("boom".to_string());
        assert_eq!(err.to_string(), "Stats capture failed: boom");
    }
}
