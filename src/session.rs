//! Grouped counter sessions and point-in-time snapshots.

use crate::config::CounterConfig;
use crate::os::read_page_fault_count;
use crate::perf::CacheMissCounter;
use crate::{arch, Result};
use log::debug;

/// A measurement session over the counters selected by a [`CounterConfig`].
///
/// The set owns the hardware cache-miss counter for its lifetime, so session
/// boundaries and counter lifetime cannot drift apart. The set itself is
/// move-only; run one session per process at a time.
#[derive(Debug)]
pub struct CounterSet {
    config: CounterConfig,
    cache_miss: Option<CacheMissCounter>,
}

impl CounterSet {
    /// Start a session, opening the hardware cache-miss counter if the
    /// config asks for one.
    pub fn start(config: CounterConfig) -> Result<CounterSet> {
        let cache_miss = if config.enabled && config.measure_cache_misses {
            Some(
                CacheMissCounter::build()
                    .target(config.cache_target)
                    .open()?,
            )
        } else {
            None
        };
        debug!("counter session started - {:?}", config);
        Ok(CounterSet { config, cache_miss })
    }

    /// Take a point-in-time reading of every active counter.
    ///
    /// A session whose config is disabled outright returns an empty snapshot
    /// with zero cycles.
    pub fn snapshot(&self) -> Result<CounterSnapshot> {
        if !self.config.enabled {
            return Ok(CounterSnapshot {
                cycles: 0,
                page_faults: None,
                cache_misses: None,
            });
        }
        let page_faults = if self.config.measure_faults {
            Some(read_page_fault_count()?)
        } else {
            None
        };
        let cache_misses = match self.cache_miss {
            Some(ref counter) => Some(counter.read()?),
            None => None,
        };
        Ok(CounterSnapshot {
            cycles: arch::read_cycle_counter(),
            page_faults,
            cache_misses,
        })
    }

    /// End the session, disabling and closing the hardware counter.
    pub fn end(mut self) -> Result<()> {
        if let Some(counter) = self.cache_miss.take() {
            counter.close()?;
        }
        debug!("counter session ended");
        Ok(())
    }
}

/// Point-in-time reading of every counter a session measures.
///
/// All values are running totals; the cost of a code region is the
/// [`delta_since`](CounterSnapshot::delta_since) of the snapshots bracketing
/// it. Sources switched off in the session's config read as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// CPU cycle counter.
    pub cycles: u64,
    /// Cumulative page faults of the process.
    pub page_faults: Option<u64>,
    /// Cumulative cache misses since the session's counter was opened.
    pub cache_misses: Option<u64>,
}

impl CounterSnapshot {
    /// Per-counter difference between this snapshot and an `earlier` one
    /// from the same session.
    ///
    /// Differences are computed wrapping, so a counter wraparound (or a
    /// swapped argument order) never panics.
    pub fn delta_since(&self, earlier: &CounterSnapshot) -> CounterSnapshot {
        CounterSnapshot {
            cycles: self.cycles.wrapping_sub(earlier.cycles),
            page_faults: match (self.page_faults, earlier.page_faults) {
                (Some(now), Some(then)) => Some(now.wrapping_sub(then)),
                _ => None,
            },
            cache_misses: match (self.cache_misses, earlier.cache_misses) {
                (Some(now), Some(then)) => Some(now.wrapping_sub(then)),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheTarget;

    #[test]
    fn test_session_brackets_a_region() {
        let _ = env_logger::builder().is_test(true).try_init();

        let set = CounterSet::start(CounterConfig::default()).unwrap();
        let before = set.snapshot().unwrap();

        // Touch a fresh buffer larger than L1 so every source moves.
        let mut buf = vec![0u8; 8 << 20];
        for i in (0..buf.len()).step_by(64) {
            buf[i] = buf[i].wrapping_add(1);
        }
        std::hint::black_box(&buf);

        let after = set.snapshot().unwrap();
        let delta = after.delta_since(&before);
        assert!(delta.cycles > 0);
        assert!(delta.page_faults.unwrap() > 0);
        assert!(delta.cache_misses.unwrap() > 0);
        set.end().unwrap();
    }

    #[test]
    fn test_delta_never_panics_on_swapped_snapshots() {
        let earlier = CounterSnapshot {
            cycles: 100,
            page_faults: Some(10),
            cache_misses: Some(20),
        };
        let later = CounterSnapshot {
            cycles: 200,
            page_faults: Some(15),
            cache_misses: Some(25),
        };
        // Subtracting in the wrong order wraps instead of panicking.
        let swapped = earlier.delta_since(&later);
        assert_eq!(swapped.cycles, 100u64.wrapping_sub(200));
        assert_eq!(swapped.page_faults, Some(10u64.wrapping_sub(15)));
        assert_eq!(swapped.cache_misses, Some(20u64.wrapping_sub(25)));

        let delta = later.delta_since(&earlier);
        assert_eq!(delta.cycles, 100);
        assert_eq!(delta.page_faults, Some(5));
        assert_eq!(delta.cache_misses, Some(5));
    }

    #[test]
    fn test_sources_opt_out() {
        let config = CounterConfig {
            measure_faults: false,
            measure_cache_misses: false,
            ..CounterConfig::default()
        };
        let set = CounterSet::start(config).unwrap();
        let snap = set.snapshot().unwrap();
        assert!(snap.cycles > 0);
        assert!(snap.page_faults.is_none());
        assert!(snap.cache_misses.is_none());
        set.end().unwrap();
    }

    #[test]
    fn test_disabled_subsystem_measures_nothing() {
        let config = CounterConfig {
            enabled: false,
            ..CounterConfig::default()
        };
        let set = CounterSet::start(config).unwrap();
        let snap = set.snapshot().unwrap();
        assert_eq!(snap.cycles, 0);
        assert!(snap.page_faults.is_none());
        assert!(snap.cache_misses.is_none());
        set.end().unwrap();
    }

    #[test]
    fn test_dtlb_session() {
        let config = CounterConfig {
            cache_target: CacheTarget::DataTlb,
            ..CounterConfig::default()
        };
        let set = CounterSet::start(config).unwrap();
        let snap = set.snapshot().unwrap();
        assert!(snap.cache_misses.is_some());
        set.end().unwrap();
    }
}
