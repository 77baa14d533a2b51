//! Thin wrappers over the kernel ABI for `perf_event_open(2)`.
//!
//! Struct and constant definitions come from the pre-generated bindings in
//! `perf-event-open-sys`; the syscall and ioctl entry points are wrapped
//! here so the rest of the crate gets `Result`s instead of raw return codes.

#![allow(missing_docs)]

use nix::ioctl_none;
use nix::libc;

pub use perf_event_open_sys::bindings::{
    perf_event_attr, PERF_COUNT_HW_CACHE_DTLB, PERF_COUNT_HW_CACHE_L1D,
    PERF_COUNT_HW_CACHE_OP_READ, PERF_COUNT_HW_CACHE_RESULT_MISS, PERF_FLAG_FD_CLOEXEC,
    PERF_TYPE_HW_CACHE,
};

// The ioctls are defined as macro functions in the kernel headers and carry
// no binding in the sys crate.
// Details at https://elixir.bootlin.com/linux/v5.3.10/source/include/uapi/linux/perf_event.h#L456
ioctl_none!(perf_event_ioc_enable, b'$', 0);
ioctl_none!(perf_event_ioc_disable, b'$', 1);
ioctl_none!(perf_event_ioc_reset, b'$', 3);

/// Rust wrapper for the `perf_event_open` system call.
pub fn perf_event_open(
    attr: &perf_event_attr,
    pid: libc::pid_t,
    cpu: libc::c_int,
    group_fd: libc::c_int,
    flags: libc::c_ulong,
) -> nix::Result<std::os::unix::io::RawFd> {
    unsafe {
        let fd = libc::syscall(
            libc::SYS_perf_event_open,
            attr as *const _,
            pid,
            cpu,
            group_fd,
            flags,
        );
        match fd {
            -1 => Err(nix::errno::Errno::last()),
            rc => Ok(rc as _),
        }
    }
}
