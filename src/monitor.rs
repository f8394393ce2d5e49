//! Monitor lifecycle: load, run, unload.
//!
//! A [`Monitor`] owns everything one monitor module needs while loaded: its
//! counters, its probe registry and the facility the probes are bound
//! through. State moves `Unloaded → Loading → Active → Unloading → Unloaded`.

use alloc::sync::Arc;
use alloc::vec::Vec;

use axerrno::{AxError, AxResult};
use spin::Mutex;

use crate::config::MonitorProfile;
use crate::counter::{CounterBank, CounterSnapshot};
use crate::probe::{
    InterceptFacility, ProbeDescriptor, ProbeHook, ProbeRegistry, RegistrationOutcome,
    RegistrationState,
};
use crate::threshold::ThresholdLogger;

const BANNER: &str = "========================================";

/// Lifecycle state of a monitor module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Loading,
    Active,
    Unloading,
}

/// Misuse of the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// `load` called on a monitor that is not unloaded.
    AlreadyLoaded(&'static str),
    /// A probe in the profile feeds a counter the profile does not declare.
    UnknownCounter {
        symbol: &'static str,
        counter: &'static str,
    },
}

impl core::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyLoaded(name) => write!(f, "Monitor already loaded: {}", name),
            Self::UnknownCounter { symbol, counter } => {
                write!(f, "Probe {} feeds unknown counter {}", symbol, counter)
            }
        }
    }
}

impl core::error::Error for LifecycleError {}

impl From<LifecycleError> for AxError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyLoaded(_) => AxError::AlreadyExists,
            LifecycleError::UnknownCounter { .. } => AxError::InvalidInput,
        }
    }
}

/// Final report produced by [`Monitor::unload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSummary {
    pub module: &'static str,
    /// Final counter values in profile order.
    pub counters: Vec<CounterSnapshot>,
    /// Symbols detached during unload, in detach order.
    pub detached: Vec<&'static str>,
}

impl MonitorSummary {
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.iter().find(|c| c.name == name).map(|c| c.value)
    }
}

/// Lifecycle controller for one monitor module.
pub struct Monitor<F: InterceptFacility> {
    profile: &'static MonitorProfile,
    facility: F,
    state: ModuleState,
    counters: CounterBank,
    registry: ProbeRegistry<F::Handle>,
}

impl<F: InterceptFacility> Monitor<F> {
    /// Create an unloaded monitor.
    pub fn new(profile: &'static MonitorProfile, facility: F) -> Self {
        Self {
            profile,
            facility,
            state: ModuleState::Unloaded,
            counters: CounterBank::new(),
            registry: ProbeRegistry::new(),
        }
    }

    pub fn profile(&self) -> &'static MonitorProfile {
        self.profile
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn counters(&self) -> &CounterBank {
        &self.counters
    }

    pub fn registry(&self) -> &ProbeRegistry<F::Handle> {
        &self.registry
    }

    /// Symbol and state of every probe.
    pub fn probes(&self) -> Vec<(&'static str, RegistrationState)> {
        self.registry.probes()
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn facility_mut(&mut self) -> &mut F {
        &mut self.facility
    }

    /// Build fresh counters and probes, then attach every probe.
    ///
    /// Individual probe failures are logged and reported in the outcome but
    /// never fail the load; the monitor is `Active` with whatever attached.
    pub fn load(&mut self) -> Result<RegistrationOutcome, LifecycleError> {
        if self.state != ModuleState::Unloaded {
            return Err(LifecycleError::AlreadyLoaded(self.profile.name));
        }
        let (counters, registry) = self.build()?;

        self.state = ModuleState::Loading;
        self.counters = counters;
        self.registry = registry;

        let info = &self.profile.info;
        log::info!("{}", BANNER);
        log::info!("{} Loading", self.profile.name);
        log::info!(
            "{} v{} ({}, {})",
            info.description,
            info.version,
            info.author,
            info.license
        );
        log::info!("{}", BANNER);

        let outcome = self.registry.register_all(&mut self.facility);

        self.state = ModuleState::Active;
        log::info!(
            "{} active: {}/{} probes attached",
            self.profile.name,
            outcome.registered.len(),
            outcome.attempted()
        );
        log::info!("{}", BANNER);

        Ok(outcome)
    }

    /// Detach every attached probe and emit the final summary.
    ///
    /// Returns `None` if the monitor was not active.
    pub fn unload(&mut self) -> Option<MonitorSummary> {
        if self.state != ModuleState::Active {
            return None;
        }
        self.state = ModuleState::Unloading;

        let detached = self.registry.unregister_all(&mut self.facility);

        log::info!("{}", BANNER);
        log::info!("{} Unloaded", self.profile.name);
        for spec in self.profile.counters {
            let value = self.counters.read(spec.name).unwrap_or(0);
            log::info!("{}: {}", spec.summary_label, value);
        }
        log::info!("{}", BANNER);

        self.state = ModuleState::Unloaded;
        Some(MonitorSummary {
            module: self.profile.name,
            counters: self.counters.snapshot(),
            detached,
        })
    }

    /// Build the counter bank and descriptors described by the profile.
    fn build(&self) -> Result<(CounterBank, ProbeRegistry<F::Handle>), LifecycleError> {
        let mut counters = CounterBank::new();
        let mut loggers: Vec<(&'static str, ThresholdLogger)> = Vec::new();
        for spec in self.profile.counters {
            let counter: Arc<_> = counters.register(spec.name);
            loggers.push((
                spec.name,
                ThresholdLogger::new(counter, spec.interval, spec.tag, spec.report_label),
            ));
        }

        let mut registry = ProbeRegistry::new();
        for probe in self.profile.probes {
            let logger = loggers
                .iter()
                .find(|(name, _)| *name == probe.counter)
                .map(|(_, logger)| logger.clone())
                .ok_or(LifecycleError::UnknownCounter {
                    symbol: probe.symbol,
                    counter: probe.counter,
                })?;
            registry.add(ProbeDescriptor::new(
                probe.symbol,
                probe.description,
                ProbeHook::new(probe.handler, logger),
            ));
        }

        Ok((counters, registry))
    }
}

/// Load a monitor into a module slot. Backs the generated `init` entry point.
///
/// Succeeds even if some probes failed to attach; fails only if the slot is
/// already occupied or the profile is inconsistent.
pub fn module_init<F, M>(
    slot: &Mutex<Option<Monitor<F>>>,
    profile: &'static MonitorProfile,
    make_facility: M,
) -> AxResult<()>
where
    F: InterceptFacility,
    M: FnOnce() -> F,
{
    let mut slot = slot.lock();
    if slot.is_some() {
        let err = LifecycleError::AlreadyLoaded(profile.name);
        log::error!("{}", err);
        return Err(err.into());
    }

    let mut monitor = Monitor::new(profile, make_facility());
    if let Err(err) = monitor.load() {
        log::error!("{}: load failed: {}", profile.name, err);
        return Err(err.into());
    }
    *slot = Some(monitor);
    Ok(())
}

/// Unload the monitor held in a module slot. Backs the generated `exit`
/// entry point; a no-op if nothing is loaded.
pub fn module_exit<F: InterceptFacility>(
    slot: &Mutex<Option<Monitor<F>>>,
) -> Option<MonitorSummary> {
    let mut monitor = slot.lock().take()?;
    monitor.unload()
}

/// Declare a monitor module with parameterless `init`/`exit` entry points.
///
/// Expands to a module holding the monitor in a single static slot, so the
/// host kernel can call `name::init()` at load and `name::exit()` at unload.
///
/// ```ignore
/// axguard::declare_monitor_module!(
///     process_guard,
///     &axguard::config::PROCESS_GUARD,
///     axguard::probe::kprobe::KprobeFacility<MyKprobeOps>,
///     axguard::probe::kprobe::KprobeFacility::new()
/// );
///
/// process_guard::init()?;
/// // ...
/// process_guard::exit();
/// ```
#[macro_export]
macro_rules! declare_monitor_module {
    ($module:ident, $profile:expr, $facility:ty, $make:expr) => {
        pub mod $module {
            #[allow(unused_imports)]
            use super::*;

            static MONITOR: $crate::spin::Mutex<
                ::core::option::Option<$crate::monitor::Monitor<$facility>>,
            > = $crate::spin::Mutex::new(::core::option::Option::None);

            /// Module load entry point.
            pub fn init() -> $crate::axerrno::AxResult<()> {
                $crate::monitor::module_init(&MONITOR, $profile, || $make)
            }

            /// Module unload entry point.
            pub fn exit() -> ::core::option::Option<$crate::monitor::MonitorSummary> {
                $crate::monitor::module_exit(&MONITOR)
            }

            /// Run `f` against the loaded monitor, if any.
            pub fn with_monitor<R>(
                f: impl FnOnce(&$crate::monitor::Monitor<$facility>) -> R,
            ) -> ::core::option::Option<R> {
                MONITOR.lock().as_ref().map(f)
            }
        }
    };
}
