//! Integration tests for the event counter bank.
//!
//! Focus on concurrent increments: no update may be lost.

use std::sync::Arc;
use std::thread;

use axguard::counter::{CounterBank, EventCounter};

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_increments_are_not_lost() {
    let counter = Arc::new(EventCounter::new("forks"));
    let threads = 8;
    let per_thread = 10_000;

    thread::scope(|s| {
        for _ in 0..threads {
            let counter = &counter;
            s.spawn(move || {
                for _ in 0..per_thread {
                    counter.increment();
                }
            });
        }
    });

    assert_eq!(counter.read(), (threads * per_thread) as u64);
}

#[test]
fn test_concurrent_increments_return_distinct_values() {
    let counter = EventCounter::new("reads");
    let threads = 4;
    let per_thread = 2_500;

    let mut seen: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    (0..per_thread)
                        .map(|_| counter.increment())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    seen.sort_unstable();
    let expected: Vec<u64> = (1..=(threads * per_thread) as u64).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_shared_counter_through_bank() {
    let mut bank = CounterBank::new();
    let syscalls = bank.register("syscalls");
    let same = bank.register("syscalls");

    thread::scope(|s| {
        s.spawn(|| (0..500).for_each(|_| {
            syscalls.increment();
        }));
        s.spawn(|| (0..500).for_each(|_| {
            same.increment();
        }));
    });

    assert_eq!(bank.read("syscalls"), Some(1000));
}

// =============================================================================
// Bank Tests
// =============================================================================

#[test]
fn test_bank_starts_at_zero() {
    let mut bank = CounterBank::new();
    bank.register("processes");
    bank.register("file_reads");

    let snapshot = bank.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|c| c.value == 0));
    assert!(!bank.is_empty());
}

#[test]
fn test_bank_get_unknown() {
    let bank = CounterBank::new();
    assert!(bank.get("missing").is_none());
    assert!(bank.is_empty());
}
