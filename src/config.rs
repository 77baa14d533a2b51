//! Runtime selection of which counters a measurement session uses.

use crate::perf::ffi;

/// Which cache the hardware miss counter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTarget {
    /// Load misses in the L1 data cache.
    L1Data,
    /// Load misses in the data TLB.
    DataTlb,
}

impl CacheTarget {
    /// Kernel cache id for this target.
    pub(crate) fn cache_id(self) -> u32 {
        match self {
            CacheTarget::L1Data => ffi::PERF_COUNT_HW_CACHE_L1D,
            CacheTarget::DataTlb => ffi::PERF_COUNT_HW_CACHE_DTLB,
        }
    }
}

impl Default for CacheTarget {
    fn default() -> Self {
        CacheTarget::L1Data
    }
}

/// Selects the counters a [`CounterSet`](crate::CounterSet) session measures.
///
/// The cycle counter is always read while `enabled` is set; page faults and
/// cache misses are opted in per source. A session with
/// `measure_cache_misses` off never opens a kernel counter descriptor.
#[derive(Debug, Clone, Copy)]
pub struct CounterConfig {
    /// Master switch; a disabled session measures nothing.
    pub enabled: bool,
    /// Read the process's OS page-fault count in each snapshot.
    pub measure_faults: bool,
    /// Open a hardware cache-miss counter for the session's lifetime.
    pub measure_cache_misses: bool,
    /// Cache targeted by the miss counter.
    pub cache_target: CacheTarget,
}

impl Default for CounterConfig {
    fn default() -> Self {
        CounterConfig {
            enabled: true,
            measure_faults: true,
            measure_cache_misses: true,
            cache_target: CacheTarget::default(),
        }
    }
}
