//! Utilities dealing with error handling in this crate.

use failure::Fail;

/// Errors produced by this crate.
///
/// Environment failures (no usable clock, no resource-usage facility, counter
/// creation rejected by the kernel) get their own variants so that callers
/// can decide whether to abort or to measure without the affected source.
#[derive(Debug, Fail)]
pub enum Error {
    /// Errors originating from calls to `std::io::*`.
    #[fail(display = "IO Error - {}", _0)]
    IO(#[cause] std::io::Error),
    /// The OS monotonic clock could not be queried.
    #[fail(display = "Monotonic clock unavailable - {}", _0)]
    ClockUnavailable(#[cause] nix::Error),
    /// The OS resource-usage query for page-fault counts failed.
    #[fail(display = "Resource usage query failed - {}", _0)]
    ResourceQueryFailed(#[cause] nix::Error),
    /// The kernel rejected creation of a hardware performance counter.
    ///
    /// Usually insufficient privilege (see `/proc/sys/kernel/perf_event_paranoid`)
    /// or an event the local PMU does not support.
    #[fail(display = "Kernel denied counter creation - {}", _0)]
    CounterCreationDenied(#[cause] nix::Error),
    /// Errors originating from calls to `libc` or other system utilities.
    #[fail(display = "System Error - {}", _0)]
    System(#[cause] nix::Error),
}

macro_rules! error_from {
    ($et: ty => $cet: expr) => {
        impl From<$et> for Error {
            #[inline]
            fn from(err: $et) -> Self {
                $cet(err)
            }
        }
    };
}

error_from!(std::io::Error => Error::IO);
error_from!(nix::Error => Error::System);

/// Result type used in this crate.
pub type Result<T> = std::result::Result<T, Error>;
