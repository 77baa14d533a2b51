//! Low-overhead probes for instrumenting a running process with hardware and
//! OS performance counters.
//!
//! The crate exposes four measurement sources:
//!
//! * the CPU's free-running cycle counter ([`arch::read_cycle_counter`]),
//! * the OS monotonic clock ([`read_os_timer_ns`]), used to calibrate the
//!   cycle counter into wall-clock units ([`estimate_cycle_frequency`]),
//! * the process's cumulative page-fault count ([`read_page_fault_count`]),
//! * a kernel-mediated hardware cache-miss counter
//!   ([`perf::CacheMissCounter`]) opened through `perf_event_open(2)`.
//!
//! A [`CounterSet`] session groups the sources selected by a
//! [`CounterConfig`] and hands out [`CounterSnapshot`]s; bracketing a region
//! of interest with two snapshots and taking the delta yields the cost of
//! that region. Every reader is a plain synchronous call; only
//! [`estimate_cycle_frequency`] blocks, for roughly its 100 ms calibration
//! window.

#![deny(missing_docs, missing_debug_implementations)]

mod errors;
pub use errors::{Error, Result};

pub mod perf;
pub use perf::ffi;

mod config;
pub use config::{CacheTarget, CounterConfig};

mod os;
pub use os::{read_os_timer_ns, read_page_fault_count, OS_TIMER_FREQ};

mod calibrate;
pub use calibrate::{estimate_cycle_frequency, estimate_cycle_frequency_with_wait};

mod session;
pub use session::{CounterSet, CounterSnapshot};

/// Architecture specific implementation details of performance counters:
#[cfg(target_arch = "x86_64")]
#[path = "arch/x86_64/mod.rs"]
pub mod arch;
