//! Integration tests for the probe registry.
//!
//! Covers partial-failure registration and reverse-order teardown.

mod common;

use std::num::NonZeroU64;
use std::sync::Arc;

use axguard::config::{SYM_FILE_OPEN, SYM_FILE_READ, SYM_PROCESS_CREATE, SYM_PROGRAM_EXEC};
use axguard::counter::EventCounter;
use axguard::handlers;
use axguard::probe::{
    FacilityEvent, ProbeDescriptor, ProbeError, ProbeHook, ProbeRegistry, RegistrationState,
    SimulatedFacility, SimulatedHandle,
};
use axguard::threshold::ThresholdLogger;
use log::Level;

const SYMBOLS: [&str; 4] = [SYM_PROCESS_CREATE, SYM_FILE_OPEN, SYM_PROGRAM_EXEC, SYM_FILE_READ];

fn descriptor(symbol: &'static str) -> ProbeDescriptor<SimulatedHandle> {
    let logger = ThresholdLogger::new(
        Arc::new(EventCounter::new(symbol)),
        NonZeroU64::new(50).unwrap(),
        "REG",
        symbol,
    );
    ProbeDescriptor::new(symbol, symbol, ProbeHook::new(handlers::monitor_fork, logger))
}

fn registry() -> ProbeRegistry<SimulatedHandle> {
    let mut reg = ProbeRegistry::new();
    for sym in SYMBOLS {
        reg.add(descriptor(sym));
    }
    reg
}

// =============================================================================
// Partial Failure
// =============================================================================

#[test]
fn test_every_failure_subset() {
    let _guard = common::capture();

    // Every subset of the four probes failing, encoded as a bitmask.
    for mask in 0u32..16 {
        common::capture_reset();
        let mut facility = SimulatedFacility::with_kernel_symbols();
        let missing: Vec<&str> = SYMBOLS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << *i) != 0)
            .map(|(_, s)| *s)
            .collect();
        for sym in &missing {
            facility.remove_symbol(sym);
        }

        let mut reg = registry();
        let outcome = reg.register_all(&mut facility);

        let m = missing.len();
        assert_eq!(outcome.attempted(), 4);
        assert_eq!(outcome.failed.len(), m, "mask {:#06b}", mask);
        assert_eq!(reg.registered_count(), 4 - m, "mask {:#06b}", mask);
        assert_eq!(common::count_at(Level::Warn), m, "mask {:#06b}", mask);

        for (symbol, state) in reg.probes() {
            let expected = if missing.contains(&symbol) {
                RegistrationState::RegistrationFailed
            } else {
                RegistrationState::Registered
            };
            assert_eq!(state, expected, "{} with mask {:#06b}", symbol, mask);
        }

        // Teardown touches exactly the registered probes, last first.
        let detached = reg.unregister_all(&mut facility);
        let expected: Vec<&str> = SYMBOLS
            .iter()
            .rev()
            .copied()
            .filter(|s| !missing.contains(s))
            .collect();
        assert_eq!(detached, expected, "mask {:#06b}", mask);
        assert!(facility.attached_symbols().is_empty());
    }
}

#[test]
fn test_warning_names_symbol_and_error() {
    let _guard = common::capture();
    let mut facility = SimulatedFacility::with_kernel_symbols();
    facility.remove_symbol(SYM_FILE_OPEN);

    let mut reg = registry();
    reg.register_all(&mut facility);

    let warnings = common::lines_containing("Failed to register probe");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains(SYM_FILE_OPEN));
    assert!(warnings[0].contains("Symbol not found"));
}

#[test]
fn test_failure_kinds_are_tolerated() {
    let _guard = common::capture();
    let mut facility = SimulatedFacility::with_kernel_symbols();
    facility.inject_failure(SYM_PROCESS_CREATE, ProbeError::ResourceExhausted);
    facility.inject_failure(
        SYM_PROGRAM_EXEC,
        ProbeError::FacilityUnavailable("text patching disabled"),
    );

    let mut reg = registry();
    let outcome = reg.register_all(&mut facility);

    assert_eq!(outcome.registered, [SYM_FILE_OPEN, SYM_FILE_READ]);
    assert_eq!(
        reg.get(SYM_PROCESS_CREATE).and_then(|d| d.last_error()),
        Some(&ProbeError::ResourceExhausted)
    );
    assert!(matches!(
        reg.get(SYM_PROGRAM_EXEC).and_then(|d| d.last_error()),
        Some(ProbeError::FacilityUnavailable(_))
    ));
}

#[test]
fn test_registered_only_when_attach_succeeded() {
    let _guard = common::capture();
    let mut facility = SimulatedFacility::with_kernel_symbols();
    facility.set_available(false);

    let mut reg = registry();
    let outcome = reg.register_all(&mut facility);

    assert!(outcome.registered.is_empty());
    assert_eq!(reg.registered_count(), 0);
    assert!(facility.journal().is_empty());
    assert!(reg.unregister_all(&mut facility).is_empty());
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_journal_attach_then_reverse_detach() {
    let _guard = common::capture();
    let mut facility = SimulatedFacility::with_kernel_symbols();
    let mut reg = registry();

    reg.register_all(&mut facility);
    reg.unregister_all(&mut facility);

    let mut expected: Vec<FacilityEvent> = SYMBOLS
        .iter()
        .map(|s| FacilityEvent::Attached(s.to_string()))
        .collect();
    expected.extend(
        SYMBOLS
            .iter()
            .rev()
            .map(|s| FacilityEvent::Detached(s.to_string())),
    );
    assert_eq!(facility.journal(), expected.as_slice());
}

#[test]
fn test_detached_probe_stops_counting() {
    let _guard = common::capture();
    let mut facility = SimulatedFacility::with_kernel_symbols();
    let mut reg = registry();
    reg.register_all(&mut facility);

    facility.fire_n(SYM_FILE_READ, 3);
    reg.unregister_all(&mut facility);
    facility.fire_n(SYM_FILE_READ, 3);

    let counter = reg
        .get(SYM_FILE_READ)
        .map(|d| d.hook().logger().counter().read());
    assert_eq!(counter, Some(3));
    assert_eq!(
        reg.get(SYM_FILE_READ).map(|d| d.state()),
        Some(RegistrationState::Unregistered)
    );
}
