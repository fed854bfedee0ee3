//! Wall clock abstraction
//!
//! The engine never reads the system clock directly; it goes through a
//! [`TimeSource`] injected at construction. This keeps the engine
//! instantiable per test and lets simulations drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of physical time, in milliseconds since the Unix epoch.
///
/// Implementations may be non-monotonic: NTP corrections can move the
/// reported time backward. The clock engine tolerates regression without
/// giving up its own monotonicity guarantee.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time before UNIX epoch")
            .as_millis() as u64
    }
}

/// Manually driven time source for tests and simulations.
///
/// Time stands still until [`set`](ManualTimeSource::set) or
/// [`advance`](ManualTimeSource::advance) is called; moving it backward is
/// allowed, which is how clock regression is exercised in tests.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}
