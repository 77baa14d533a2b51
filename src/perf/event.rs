//! The process-scoped hardware cache-miss counter.

use crate::config::CacheTarget;
use crate::perf::ffi;
use crate::{Error, Result};
use log::debug;
use nix::libc;
use std::convert::TryInto;
use std::os::unix::io::{AsRawFd, FromRawFd};

/// An open kernel performance counter tracking data-cache load misses.
///
/// The handle owns the underlying perf event file descriptor. It comes back
/// from [`CacheMissCounterBuilder::open`] already reset and enabled;
/// [`read`](CacheMissCounter::read) returns a running total from that point,
/// and [`close`](CacheMissCounter::close) (or dropping the handle) releases
/// the kernel-side resource. There is no pause/resume: measuring again after
/// a close means opening a fresh counter.
///
/// The handle is move-only. The kernel multiplexes hardware counters, so
/// keeping at most one alive per process is the supported pattern; a second
/// live handle makes both counts approximate.
#[derive(Debug)]
pub struct CacheMissCounter {
    /// File owning the underlying perf event descriptor.
    file: std::fs::File,
}

impl CacheMissCounter {
    /// Construct a new counter using the associated builder.
    pub fn build() -> CacheMissCounterBuilder {
        CacheMissCounterBuilder::default()
    }

    /// Read the cumulative miss count since the counter was opened.
    ///
    /// Reading never resets or disables the counter; bracket a region with
    /// two reads and subtract to cost it.
    pub fn read(&self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        nix::unistd::read(self.file.as_raw_fd(), &mut bytes)?;
        Ok(u64::from_ne_bytes(bytes))
    }

    /// Disable the counter and release the kernel-side resource.
    ///
    /// Dropping the handle has the same effect (the kernel tears the event
    /// down when its descriptor closes); this form surfaces ioctl errors.
    pub fn close(self) -> Result<()> {
        self.disable()?;
        debug!("closed cache miss counter fd {}", self.file.as_raw_fd());
        Ok(())
    }

    /// Enable counting for the event.
    fn enable(&self) -> Result<()> {
        unsafe {
            ffi::perf_event_ioc_enable(self.file.as_raw_fd())?;
        }
        Ok(())
    }

    /// Disable counting for the event.
    fn disable(&self) -> Result<()> {
        unsafe {
            ffi::perf_event_ioc_disable(self.file.as_raw_fd())?;
        }
        Ok(())
    }

    /// Reset the event's count to zero.
    fn reset(&self) -> Result<()> {
        unsafe {
            ffi::perf_event_ioc_reset(self.file.as_raw_fd())?;
        }
        Ok(())
    }
}

/// Helper struct to build a `CacheMissCounter`.
#[derive(Debug)]
pub struct CacheMissCounterBuilder {
    /// Target process ID.
    ///
    /// Defaults to the current process.
    pid: libc::pid_t,
    /// Target CPU ID.
    ///
    /// Defaults to all CPUs.
    cpuid: libc::c_int,
    /// Cache whose load misses are counted.
    ///
    /// Defaults to the L1 data cache.
    target: CacheTarget,
}

impl Default for CacheMissCounterBuilder {
    fn default() -> Self {
        CacheMissCounterBuilder {
            pid: 0,
            cpuid: -1,
            target: CacheTarget::default(),
        }
    }
}

macro_rules! builder_pattern {
    ($(#[$outer:meta])* $var_name: ident : $var_type: ty) => {
        $(#[$outer])*
        pub fn $var_name(mut self, $var_name: $var_type) -> Self {
            self.$var_name = $var_name;
            self
        }
    };
}

impl CacheMissCounterBuilder {
    /// Set the fields of a `perf_event_attr` based on this builder.
    fn _set_attr_config(&self, attr: &mut ffi::perf_event_attr) {
        attr.size = std::mem::size_of::<ffi::perf_event_attr>()
            .try_into()
            .unwrap();
        attr.type_ = ffi::PERF_TYPE_HW_CACHE;
        attr.config = u64::from(
            self.target.cache_id()
                | (ffi::PERF_COUNT_HW_CACHE_OP_READ << 8)
                | (ffi::PERF_COUNT_HW_CACHE_RESULT_MISS << 16),
        );
        // User-space events only; the counter stays disabled until it has
        // been reset, so the enable point is the zero point.
        attr.set_disabled(1);
        attr.set_exclude_kernel(1);
        attr.set_exclude_hv(1);
    }

    /// Open the counter: create the event disabled, reset it to zero, then
    /// enable it.
    ///
    /// Fails with [`Error::CounterCreationDenied`] when the kernel rejects
    /// the event, typically for insufficient privilege
    /// (`/proc/sys/kernel/perf_event_paranoid`) or an unsupported PMU event.
    pub fn open(self) -> Result<CacheMissCounter> {
        let mut attr = ffi::perf_event_attr::default();
        self._set_attr_config(&mut attr);

        let fd = ffi::perf_event_open(
            &attr,
            self.pid,
            self.cpuid,
            -1,
            ffi::PERF_FLAG_FD_CLOEXEC as _,
        )
        .map_err(Error::CounterCreationDenied)?;

        let counter = CacheMissCounter {
            file: unsafe { std::fs::File::from_raw_fd(fd) },
        };
        counter.reset()?;
        counter.enable()?;
        debug!("opened {:?} miss counter on fd {}", self.target, fd);
        Ok(counter)
    }

    builder_pattern!(
        /// Set process to be monitored.
        ///
        /// Set `0` for the current process and `-1` for the whole system.
        pid: libc::pid_t
    );

    builder_pattern!(
        /// Set CPU to be monitored.
        ///
        /// Set `-1` for all CPUs.
        cpuid: libc::c_int
    );

    builder_pattern!(
        /// Set the cache whose load misses are counted.
        target: CacheTarget
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scan a buffer much larger than L1 with one load per cache line.
    fn scan_large_buffer() -> u64 {
        let buf = vec![1u8; 8 << 20];
        let mut sum = 0u64;
        for i in (0..buf.len()).step_by(64) {
            sum += u64::from(buf[i]);
        }
        std::hint::black_box(sum)
    }

    // The paranoid value needs to be set correctly for the other tests to pass
    #[test]
    fn test_kernel_paranoid_level() {
        let paranoid: i8 = std::fs::read_to_string("/proc/sys/kernel/perf_event_paranoid")
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(paranoid <= 2);
    }

    #[test]
    fn test_open_read_close() {
        let counter = CacheMissCounter::build().open().unwrap();
        let first = counter.read().unwrap();

        scan_large_buffer();

        let second = counter.read().unwrap();
        assert!(second >= first);
        // An 8 MiB scan misses L1 on nearly every line; the exact count is
        // hardware dependent but the delta is comfortably above this floor.
        assert!(second - first > 1000, "delta {}", second - first);
        counter.close().unwrap();
    }

    #[test]
    fn test_reopen_restarts_from_zero() {
        let counter = CacheMissCounter::build().open().unwrap();
        scan_large_buffer();
        let grown = counter.read().unwrap();
        counter.close().unwrap();
        assert!(grown > 1000);

        let fresh = CacheMissCounter::build().open().unwrap();
        let restart = fresh.read().unwrap();
        assert!(restart < grown / 10, "stale count {} after reopen", restart);
        fresh.close().unwrap();
    }

    #[test]
    fn test_dtlb_target_opens() {
        let counter = CacheMissCounter::build()
            .target(CacheTarget::DataTlb)
            .open()
            .unwrap();
        assert!(counter.read().is_ok());
        counter.close().unwrap();
    }
}
