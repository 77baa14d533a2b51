//! Utilities specific to the x86_64 architecture.

/// Read the CPU's free-running timestamp counter.
///
/// The read is deliberately not serializing: it can be reordered with
/// neighboring instructions, but costs only a handful of cycles, which is
/// the better trade when bracketing short regions. Only the difference
/// between two reads on the same core is meaningful.
#[inline(always)]
pub fn read_cycle_counter() -> u64 {
    unsafe { core::arch::x86_64::_rdtsc() }
}
