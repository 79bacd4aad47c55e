use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// Process-host memory snapshot, reported in the run summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    pub used_mb: u64,
    pub avail_mb: u64,
}

/// Sample host memory. The pipeline is a one-shot batch so this is only
/// called at run start and end; a fresh refresh per call is fine.
pub fn memory_stats_mb() -> MemoryStats {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
    );
    let total_mb = sys.total_memory() / (1024 * 1024);
    let avail_mb = sys.available_memory() / (1024 * 1024);
    MemoryStats {
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}
