//! Per-module probe registry.
//!
//! Registers every probe independently so one missing symbol never stops the
//! rest from attaching, and detaches in reverse registration order.

use alloc::vec::Vec;

use axerrno::AxError;

use super::descriptor::{ProbeDescriptor, RegistrationState};
use super::facility::InterceptFacility;
use super::ProbeError;

/// Result of a full registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Symbols that attached, in registration order.
    pub registered: Vec<&'static str>,
    /// Symbols that failed, with the reason.
    pub failed: Vec<(&'static str, ProbeError)>,
}

impl RegistrationOutcome {
    pub fn attempted(&self) -> usize {
        self.registered.len() + self.failed.len()
    }

    /// Whether every probe attached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered set of probes belonging to one monitor.
pub struct ProbeRegistry<H> {
    descriptors: Vec<ProbeDescriptor<H>>,
}

impl<H> ProbeRegistry<H> {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Append a probe. Registration follows insertion order.
    pub fn add(&mut self, descriptor: ProbeDescriptor<H>) {
        self.descriptors.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&ProbeDescriptor<H>> {
        self.descriptors.iter().find(|d| d.target_symbol() == symbol)
    }

    /// Symbol and state of every probe, in registration order.
    pub fn probes(&self) -> Vec<(&'static str, RegistrationState)> {
        self.descriptors
            .iter()
            .map(|d| (d.target_symbol(), d.state()))
            .collect()
    }

    pub fn registered_count(&self) -> usize {
        self.descriptors
            .iter()
            .filter(|d| d.state() == RegistrationState::Registered)
            .count()
    }

    /// Try to attach every probe that is not yet registered.
    ///
    /// Never stops at the first failure: each failure is logged with its
    /// symbol and collected, and the remaining probes are still attempted.
    pub fn register_all<F>(&mut self, facility: &mut F) -> RegistrationOutcome
    where
        F: InterceptFacility<Handle = H>,
    {
        let mut outcome = RegistrationOutcome::default();

        for desc in self
            .descriptors
            .iter_mut()
            .filter(|d| d.state() != RegistrationState::Registered)
        {
            let symbol = desc.target_symbol();
            match desc.register(facility) {
                Ok(()) => {
                    log::info!("Monitoring: {} ({})", desc.description(), symbol);
                    outcome.registered.push(symbol);
                }
                Err(err) => {
                    log::warn!(
                        "Failed to register probe for {}: {} ({:?})",
                        symbol,
                        err,
                        AxError::from(err.clone())
                    );
                    outcome.failed.push((symbol, err));
                }
            }
        }

        outcome
    }

    /// Detach every registered probe, last attached first.
    ///
    /// Probes that never reached `Registered` are skipped. Returns the
    /// detached symbols in detach order.
    pub fn unregister_all<F>(&mut self, facility: &mut F) -> Vec<&'static str>
    where
        F: InterceptFacility<Handle = H>,
    {
        let mut detached = Vec::new();

        for desc in self
            .descriptors
            .iter_mut()
            .rev()
            .filter(|d| d.state() == RegistrationState::Registered)
        {
            desc.unregister(facility);
            log::debug!("probe: detached {}", desc.target_symbol());
            detached.push(desc.target_symbol());
        }

        detached
    }
}

impl<H> Default for ProbeRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
