//! Interception facility backends.
//!
//! A facility is whatever the kernel offers to run a function on entry to a
//! named symbol. The registry only talks to it through [`InterceptFacility`].

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use spin::Mutex;

use super::{ProbeError, ProbeHook};

/// Backend that binds probe hooks to kernel symbols.
pub trait InterceptFacility {
    /// Proof of a live attachment, consumed by [`detach`](Self::detach).
    type Handle;

    /// Bind `hook` to `symbol`. Returns a handle only if the hook is live.
    fn attach(&mut self, symbol: &str, hook: ProbeHook) -> Result<Self::Handle, ProbeError>;

    /// Remove an attachment. Must not return while the hook can still be
    /// entered on another CPU.
    fn detach(&mut self, handle: Self::Handle);
}

/// Attach/detach journal entry recorded by [`SimulatedFacility`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityEvent {
    Attached(String),
    Detached(String),
}

/// Handle for a hook attached to a [`SimulatedFacility`].
#[derive(Debug)]
pub struct SimulatedHandle {
    id: u64,
    symbol: String,
}

impl SimulatedHandle {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

struct HookEntry {
    id: u64,
    symbol: String,
    hook: ProbeHook,
}

/// Software interception facility.
///
/// Keeps its own symbol table and runs the attached hooks when an event is
/// [`fire`](Self::fire)d. Failures can be injected per symbol, and every
/// attach/detach is journaled.
pub struct SimulatedFacility {
    symbols: BTreeSet<String>,
    faults: BTreeMap<String, ProbeError>,
    /// Maximum number of live hooks (`None` = unlimited).
    capacity: Option<usize>,
    available: bool,
    hooks: Mutex<Vec<HookEntry>>,
    next_id: u64,
    journal: Vec<FacilityEvent>,
}

impl SimulatedFacility {
    /// Facility with an empty symbol table.
    pub fn new() -> Self {
        Self {
            symbols: BTreeSet::new(),
            faults: BTreeMap::new(),
            capacity: None,
            available: true,
            hooks: Mutex::new(Vec::new()),
            next_id: 1,
            journal: Vec::new(),
        }
    }

    /// Facility exporting the given symbols.
    pub fn with_symbols(symbols: &[&str]) -> Self {
        let mut facility = Self::new();
        for sym in symbols {
            facility.add_symbol(sym);
        }
        facility
    }

    /// Facility exporting every symbol the built-in monitors probe.
    pub fn with_kernel_symbols() -> Self {
        Self::with_symbols(crate::config::KERNEL_SYMBOLS)
    }

    pub fn add_symbol(&mut self, symbol: &str) {
        self.symbols.insert(symbol.into());
    }

    /// Drop a symbol, as if the kernel was built without it.
    pub fn remove_symbol(&mut self, symbol: &str) {
        self.symbols.remove(symbol);
    }

    /// Make the next attach of `symbol` fail with `err`.
    pub fn inject_failure(&mut self, symbol: &str, err: ProbeError) {
        self.faults.insert(symbol.into(), err);
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = Some(capacity);
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Simulate entry into `symbol` on the current CPU.
    ///
    /// Returns the number of hooks that ran. The hook table lock is released
    /// before any hook runs.
    pub fn fire(&self, symbol: &str) -> usize {
        let hooks: Vec<ProbeHook> = self
            .hooks
            .lock()
            .iter()
            .filter(|e| e.symbol == symbol)
            .map(|e| e.hook.clone())
            .collect();

        for hook in &hooks {
            hook.fire();
        }
        hooks.len()
    }

    /// Simulate `count` consecutive entries into `symbol`.
    pub fn fire_n(&self, symbol: &str, count: usize) {
        for _ in 0..count {
            self.fire(symbol);
        }
    }

    /// Symbols with a live hook, in attach order.
    pub fn attached_symbols(&self) -> Vec<String> {
        self.hooks.lock().iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn journal(&self) -> &[FacilityEvent] {
        &self.journal
    }
}

impl Default for SimulatedFacility {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptFacility for SimulatedFacility {
    type Handle = SimulatedHandle;

    fn attach(&mut self, symbol: &str, hook: ProbeHook) -> Result<SimulatedHandle, ProbeError> {
        if !self.available {
            return Err(ProbeError::FacilityUnavailable("simulated facility disabled"));
        }
        if let Some(err) = self.faults.remove(symbol) {
            return Err(err);
        }
        if !self.symbols.contains(symbol) {
            return Err(ProbeError::SymbolNotFound(symbol.into()));
        }

        let hooks = self.hooks.get_mut();
        if self.capacity.is_some_and(|cap| hooks.len() >= cap) {
            return Err(ProbeError::ResourceExhausted);
        }

        let id = self.next_id;
        self.next_id += 1;
        hooks.push(HookEntry {
            id,
            symbol: symbol.into(),
            hook,
        });
        self.journal.push(FacilityEvent::Attached(symbol.into()));
        log::debug!("simulated: attached {} (id={})", symbol, id);

        Ok(SimulatedHandle {
            id,
            symbol: symbol.into(),
        })
    }

    fn detach(&mut self, handle: SimulatedHandle) {
        let hooks = self.hooks.get_mut();
        let before = hooks.len();
        hooks.retain(|e| e.id != handle.id);
        debug_assert_eq!(before, hooks.len() + 1, "unknown handle for {}", handle.symbol);

        log::debug!("simulated: detached {} (id={})", handle.symbol, handle.id);
        self.journal.push(FacilityEvent::Detached(handle.symbol));
    }
}
