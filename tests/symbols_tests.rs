//! Integration tests for kernel symbol table management.
//!
//! Note: real lookups need a kallsyms blob, which is not available in the
//! host test environment. These tests cover the API behavior and errors.

#![cfg(feature = "symbols")]

use axguard::symbols::{self, Error};

// =============================================================================
// Error Display Tests
// =============================================================================

#[test]
fn test_error_display_already_initialized() {
    let msg = format!("{}", Error::AlreadyInitialized);
    assert!(msg.contains("already initialized"));
}

#[test]
fn test_error_display_parse_error() {
    let msg = format!("{}", Error::ParseError("invalid format"));
    assert!(msg.contains("invalid format"));
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_lookup_before_init_is_none() {
    // No test in this binary loads a valid table.
    assert!(!symbols::is_initialized());
    assert_eq!(symbols::lookup_addr("wake_up_new_task"), None);
}

#[test]
fn test_init_invalid_blob() {
    let invalid: &'static [u8] = Box::leak(vec![0xFF; 4].into_boxed_slice());
    assert!(symbols::init(invalid, 0x1000, 0x2000).is_err());
    assert!(!symbols::is_initialized());
}
