//! AxGuard kernel event monitors
//!
//! Attaches lightweight probes to kernel entry points (process creation,
//! file open, program execution, file read), counts how often each fires and
//! logs a report every time a counter reaches its configured interval.
//! Observation only: handlers never change the probed function's behavior.
//!
//! # Features
//!
//! - `symbols` - Kernel symbol table lookup (default)
//! - `kprobe-backend` - Bind probes through the `kprobe` crate (requires symbols)
//! - `axhal` - Real clock and CPU id for report stamps
//!
//! # Quick Start
//!
//! ```ignore
//! use axguard::config::PROCESS_GUARD;
//! use axguard::monitor::Monitor;
//! use axguard::probe::kprobe::KprobeFacility;
//!
//! let mut monitor = Monitor::new(&PROCESS_GUARD, KprobeFacility::<MyOps>::new());
//!
//! // Attaches every probe it can; failures are logged, never fatal.
//! let outcome = monitor.load().unwrap();
//! for (symbol, err) in &outcome.failed {
//!     log::warn!("{} unavailable: {}", symbol, err);
//! }
//!
//! // ... later, at module unload:
//! let summary = monitor.unload().unwrap();
//! ```

#![no_std]

extern crate alloc;

// =============================================================================
// Platform Abstraction (for testing support)
// =============================================================================

pub mod platform;

// =============================================================================
// Symbols Module
// =============================================================================

#[cfg(feature = "symbols")]
pub mod symbols;

// =============================================================================
// Counters and Reporting
// =============================================================================

pub mod counter;
pub mod threshold;

// =============================================================================
// Probes
// =============================================================================

pub mod handlers;
pub mod probe;

// =============================================================================
// Monitors
// =============================================================================

pub mod config;
pub mod monitor;

// Re-export key types for convenience
pub use counter::{CounterBank, CounterSnapshot, EventCounter};
pub use monitor::{LifecycleError, ModuleState, Monitor, MonitorSummary};
pub use probe::{
    InterceptFacility, ProbeDescriptor, ProbeError, ProbeHandler, ProbeRegistry,
    RegistrationOutcome, RegistrationState, SimulatedFacility,
};
pub use threshold::ThresholdLogger;

#[cfg(feature = "kprobe-backend")]
pub use probe::kprobe::KprobeFacility;

// Used by `declare_monitor_module!` expansions.
#[doc(hidden)]
pub use axerrno;
#[doc(hidden)]
pub use spin;
