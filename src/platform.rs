//! Host kernel hooks used to stamp threshold reports.
//!
//! With the `axhal` feature the real clock and CPU id are used; otherwise
//! (host builds and tests) both come from settable atomics.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Clock and CPU identity provided by the host kernel.
///
/// Both calls run inside probe handlers, so implementations must be
/// lock-free and must not sleep.
pub trait PlatformOps {
    /// Monotonic time in nanoseconds.
    fn time_ns() -> u64;

    /// Id of the CPU executing the caller.
    fn cpu_id() -> u32;
}

#[cfg(all(not(test), feature = "axhal"))]
pub struct RealPlatform;

#[cfg(all(not(test), feature = "axhal"))]
impl PlatformOps for RealPlatform {
    fn time_ns() -> u64 {
        axhal::time::monotonic_time().as_nanos() as u64
    }

    fn cpu_id() -> u32 {
        axhal::percpu::this_cpu_id() as u32
    }
}

static MOCK_TIME_NS: AtomicU64 = AtomicU64::new(0);
static MOCK_CPU_ID: AtomicU32 = AtomicU32::new(0);

/// Settable platform for host builds.
#[cfg(any(test, not(feature = "axhal")))]
pub struct MockPlatform;

#[cfg(any(test, not(feature = "axhal")))]
impl PlatformOps for MockPlatform {
    fn time_ns() -> u64 {
        MOCK_TIME_NS.load(Ordering::Relaxed)
    }

    fn cpu_id() -> u32 {
        MOCK_CPU_ID.load(Ordering::Relaxed)
    }
}

pub fn set_mock_time(ns: u64) {
    MOCK_TIME_NS.store(ns, Ordering::Relaxed);
}

pub fn set_mock_cpu_id(id: u32) {
    MOCK_CPU_ID.store(id, Ordering::Relaxed);
}

#[cfg(all(not(test), feature = "axhal"))]
pub type Platform = RealPlatform;

#[cfg(any(test, not(feature = "axhal")))]
pub type Platform = MockPlatform;

#[inline]
pub fn time_ns() -> u64 {
    Platform::time_ns()
}

#[inline]
pub fn cpu_id() -> u32 {
    Platform::cpu_id()
}
