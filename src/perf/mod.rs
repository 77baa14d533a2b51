//! Interfaces that deal with the kernel perf subsystem.

pub mod ffi;

mod event;
pub use event::{CacheMissCounter, CacheMissCounterBuilder};
