//! Threshold reporting on top of event counters.

use alloc::sync::Arc;
use core::num::NonZeroU64;

use crate::counter::EventCounter;
use crate::platform;

/// Emits a report line each time a counter reaches a multiple of `interval`.
///
/// The logger holds no state of its own beyond the shared counter, so it is
/// cheap to clone into every probe that feeds the same counter.
#[derive(Debug, Clone)]
pub struct ThresholdLogger {
    counter: Arc<EventCounter>,
    interval: NonZeroU64,
    /// Report prefix, e.g. `PROC_GUARD`.
    tag: &'static str,
    /// Human-readable event category, e.g. `process creations`.
    label: &'static str,
}

impl ThresholdLogger {
    pub fn new(
        counter: Arc<EventCounter>,
        interval: NonZeroU64,
        tag: &'static str,
        label: &'static str,
    ) -> Self {
        Self {
            counter,
            interval,
            tag,
            label,
        }
    }

    /// The watched counter.
    pub fn counter(&self) -> &Arc<EventCounter> {
        &self.counter
    }

    pub fn interval(&self) -> u64 {
        self.interval.get()
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether `value` lands exactly on a reporting boundary.
    #[inline]
    pub fn is_threshold(&self, value: u64) -> bool {
        value % self.interval.get() == 0
    }

    /// Report `new_value` if it is a multiple of the interval.
    ///
    /// `new_value` must be the value returned by the increment that just
    /// happened, not a fresh read: two CPUs racing on the counter each get a
    /// distinct value, so every multiple is reported exactly once.
    pub fn on_increment(&self, new_value: u64) {
        if !self.is_threshold(new_value) {
            return;
        }
        log::info!(
            "[{}] {}: {} (cpu={} ts_ns={})",
            self.tag,
            self.label,
            new_value,
            platform::cpu_id(),
            platform::time_ns()
        );
    }

    /// Count one event and report if a threshold was reached.
    #[inline]
    pub fn record(&self) {
        let value = self.counter.increment();
        self.on_increment(value);
    }
}
