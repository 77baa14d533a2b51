//! Cycle-counter frequency estimation against the OS monotonic clock.

use crate::os::{read_os_timer_ns, OS_TIMER_FREQ};
use crate::{arch, Result};
use log::debug;

/// Default calibration window in milliseconds.
const DEFAULT_WAIT_MS: u64 = 100;

/// Estimate the cycle counter's frequency in cycles per second.
///
/// Blocks the calling thread for roughly 100 ms. Call it once per process
/// and keep the result for converting cycle deltas into wall-clock time.
pub fn estimate_cycle_frequency() -> Result<u64> {
    estimate_cycle_frequency_with_wait(DEFAULT_WAIT_MS)
}

/// Estimate the cycle counter's frequency over a caller-chosen window.
///
/// The calibration busy-polls the monotonic clock for `wait_ms` milliseconds
/// rather than sleeping: a scheduler wake-up at the end of a sleep would land
/// an unpredictable amount of time after the window closes and skew the
/// estimate. The spin cannot be interrupted; callers needing cancellation
/// must run this on an execution context they can abandon.
///
/// Returns `0` if the clock did not advance over the window. A zero result
/// means calibration failed and must not be used to convert cycles to time.
pub fn estimate_cycle_frequency_with_wait(wait_ms: u64) -> Result<u64> {
    let cycles_start = arch::read_cycle_counter();
    let os_start = read_os_timer_ns()?;

    let os_wait_time = OS_TIMER_FREQ * wait_ms / 1000;
    let mut os_elapsed: u64 = 0;
    while os_elapsed < os_wait_time {
        os_elapsed = read_os_timer_ns()? - os_start;
    }

    let cycles_elapsed = arch::read_cycle_counter() - cycles_start;
    if os_elapsed == 0 {
        return Ok(0);
    }
    let cycle_freq = OS_TIMER_FREQ * cycles_elapsed / os_elapsed;
    debug!(
        "estimated cycle frequency {} Hz from {} cycles over {} ns",
        cycle_freq, cycles_elapsed, os_elapsed
    );
    Ok(cycle_freq)
}
