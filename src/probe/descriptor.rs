//! A single probe: target symbol, handler, and registration state.

use super::facility::InterceptFacility;
use super::{ProbeError, ProbeHook};

/// Registration state of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Not attached; the initial state and the state after detach.
    Unregistered,
    /// Attached; the facility will run the handler.
    Registered,
    /// The attach call failed; the probe stays inactive.
    RegistrationFailed,
}

/// Binding to the facility. The handle only exists while attached.
enum Binding<H> {
    Unbound,
    Bound(H),
    Failed(ProbeError),
}

/// Binds a handler to a kernel symbol.
pub struct ProbeDescriptor<H> {
    target_symbol: &'static str,
    /// Short description for the load banner, e.g. `open() syscall`.
    description: &'static str,
    hook: ProbeHook,
    binding: Binding<H>,
}

impl<H> ProbeDescriptor<H> {
    pub fn new(target_symbol: &'static str, description: &'static str, hook: ProbeHook) -> Self {
        Self {
            target_symbol,
            description,
            hook,
            binding: Binding::Unbound,
        }
    }

    pub fn target_symbol(&self) -> &'static str {
        self.target_symbol
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn hook(&self) -> &ProbeHook {
        &self.hook
    }

    pub fn state(&self) -> RegistrationState {
        match self.binding {
            Binding::Unbound => RegistrationState::Unregistered,
            Binding::Bound(_) => RegistrationState::Registered,
            Binding::Failed(_) => RegistrationState::RegistrationFailed,
        }
    }

    /// Error from the last failed attach, if the probe is in the failed state.
    pub fn last_error(&self) -> Option<&ProbeError> {
        match &self.binding {
            Binding::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Attach the handler through `facility`.
    ///
    /// The state becomes `Registered` only if the facility reported success.
    /// A probe that is already registered is left untouched.
    pub(crate) fn register<F>(&mut self, facility: &mut F) -> Result<(), ProbeError>
    where
        F: InterceptFacility<Handle = H>,
    {
        if let Binding::Bound(_) = self.binding {
            return Err(ProbeError::AlreadyAttached(self.target_symbol.into()));
        }

        match facility.attach(self.target_symbol, self.hook.clone()) {
            Ok(handle) => {
                self.binding = Binding::Bound(handle);
                Ok(())
            }
            Err(err) => {
                self.binding = Binding::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Detach the handler and return to `Unregistered`.
    ///
    /// # Panics
    ///
    /// Panics if the probe is not `Registered`. Detaching something the
    /// facility never attached is a bookkeeping bug, not a runtime condition.
    pub(crate) fn unregister<F>(&mut self, facility: &mut F)
    where
        F: InterceptFacility<Handle = H>,
    {
        let state = self.state();
        match core::mem::replace(&mut self.binding, Binding::Unbound) {
            Binding::Bound(handle) => facility.detach(handle),
            _ => panic!(
                "probe {}: detach requested in state {:?}",
                self.target_symbol, state
            ),
        }
    }
}

impl<H> core::fmt::Debug for ProbeDescriptor<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProbeDescriptor")
            .field("target_symbol", &self.target_symbol)
            .field("state", &self.state())
            .finish()
    }
}
