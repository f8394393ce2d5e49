//! Probe framework: descriptors, the per-module registry, and the
//! interception facilities probes are bound through.
//!
//! - [`descriptor`]: one symbol/handler binding and its registration state
//! - [`registry`]: ordered descriptors of one monitor, partial-failure
//!   tolerant registration and LIFO teardown
//! - [`facility`]: the backend seam plus a software [`SimulatedFacility`]
//! - [`kprobe`]: the real backend on top of the `kprobe` crate

extern crate alloc;

use alloc::string::String;

use axerrno::AxError;

use crate::threshold::ThresholdLogger;

pub mod descriptor;
pub mod facility;
#[cfg(feature = "kprobe-backend")]
pub mod kprobe;
pub mod registry;

pub use descriptor::{ProbeDescriptor, RegistrationState};
pub use facility::{FacilityEvent, InterceptFacility, SimulatedFacility, SimulatedHandle};
pub use registry::{ProbeRegistry, RegistrationOutcome};

/// Function run on entry to a probed symbol.
///
/// Runs with interrupts effectively disabled, possibly on several CPUs at
/// once. It must not block, sleep or allocate, and it cannot alter the
/// probed function's control flow.
pub type ProbeHandler = fn(&ThresholdLogger);

/// Handler plus the state it reports into, as handed to a facility.
#[derive(Debug, Clone)]
pub struct ProbeHook {
    handler: ProbeHandler,
    logger: ThresholdLogger,
}

impl ProbeHook {
    pub fn new(handler: ProbeHandler, logger: ThresholdLogger) -> Self {
        Self { handler, logger }
    }

    /// Run the handler once.
    #[inline]
    pub fn fire(&self) {
        (self.handler)(&self.logger)
    }

    pub fn logger(&self) -> &ThresholdLogger {
        &self.logger
    }
}

/// Reasons a single probe failed to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The target symbol does not exist in the running kernel.
    SymbolNotFound(String),
    /// The facility ran out of probe slots or memory.
    ResourceExhausted,
    /// The interception facility cannot be used right now.
    FacilityUnavailable(&'static str),
    /// A probe is already attached at this symbol.
    AlreadyAttached(String),
}

impl core::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SymbolNotFound(name) => write!(f, "Symbol not found: {}", name),
            Self::ResourceExhausted => write!(f, "No probe resources left"),
            Self::FacilityUnavailable(why) => {
                write!(f, "Interception facility unavailable: {}", why)
            }
            Self::AlreadyAttached(name) => write!(f, "Probe already attached: {}", name),
        }
    }
}

impl core::error::Error for ProbeError {}

impl From<ProbeError> for AxError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::SymbolNotFound(_) => AxError::NotFound,
            ProbeError::ResourceExhausted => AxError::NoMemory,
            ProbeError::FacilityUnavailable(_) => AxError::Unsupported,
            ProbeError::AlreadyAttached(_) => AxError::AlreadyExists,
        }
    }
}
