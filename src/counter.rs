//! Event counter bank.
//!
//! Named, monotonically increasing counters that handlers bump from any CPU
//! without taking a lock. Values wrap at `u64::MAX`.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// A single named event counter.
#[derive(Debug)]
pub struct EventCounter {
    /// Counter name used in reports.
    name: &'static str,
    /// Number of recorded events.
    value: AtomicU64,
}

impl EventCounter {
    /// Create a counter starting at zero.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicU64::new(0),
        }
    }

    /// Create a counter starting at `value`.
    pub const fn with_value(name: &'static str, value: u64) -> Self {
        Self {
            name,
            value: AtomicU64::new(value),
        }
    }

    /// Counter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Atomically add one and return the updated value.
    ///
    /// Each caller observes a distinct value, so concurrent callers never
    /// lose an increment.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Current value.
    #[inline]
    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Take a point-in-time snapshot.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            name: self.name,
            value: self.read(),
        }
    }
}

/// Immutable snapshot of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub name: &'static str,
    pub value: u64,
}

/// Ordered set of counters owned by one monitor.
#[derive(Debug, Default)]
pub struct CounterBank {
    counters: Vec<Arc<EventCounter>>,
}

impl CounterBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self {
            counters: Vec::new(),
        }
    }

    /// Register a counter, or return the existing one with the same name.
    pub fn register(&mut self, name: &'static str) -> Arc<EventCounter> {
        if let Some(existing) = self.get(name) {
            return existing;
        }
        let counter = Arc::new(EventCounter::new(name));
        self.counters.push(counter.clone());
        counter
    }

    /// Look up a counter by name.
    pub fn get(&self, name: &str) -> Option<Arc<EventCounter>> {
        self.counters.iter().find(|c| c.name == name).cloned()
    }

    /// Current value of a named counter.
    pub fn read(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.read())
    }

    /// Number of counters in the bank.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Snapshot all counters in registration order.
    pub fn snapshot(&self) -> Vec<CounterSnapshot> {
        self.counters.iter().map(|c| c.snapshot()).collect()
    }
}
