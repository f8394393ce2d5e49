//! Kprobe backend.
//!
//! Binds probe hooks through the `kprobe` crate: the target symbol is
//! resolved through the kernel symbol table, a breakpoint is armed at its
//! address, and the hook travels to the pre-handler as probe user data so the
//! handler never has to look anything up under a lock.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::sync::Arc;

use super::facility::InterceptFacility;
use super::{ProbeError, ProbeHook};
use crate::symbols;

/// Lock type alias for the kprobe library
type LockType = spin::Mutex<()>;

/// Default number of probes one facility may arm.
pub const DEFAULT_CAPACITY: usize = 16;

/// Resolves a target symbol to the address the breakpoint is armed at.
pub type SymbolLookup = fn(&str) -> Result<u64, ProbeError>;

/// Lookup through the global kernel symbol table.
pub fn kernel_symbol_lookup(symbol: &str) -> Result<u64, ProbeError> {
    if !symbols::is_initialized() {
        return Err(ProbeError::FacilityUnavailable("symbol table not initialized"));
    }
    symbols::lookup_addr(symbol).ok_or_else(|| ProbeError::SymbolNotFound(symbol.into()))
}

/// Handle to an armed kprobe. Dropping it without [`detach`] leaks the
/// breakpoint, so the registry always hands it back.
///
/// [`detach`]: InterceptFacility::detach
pub struct KprobeHandle<O: kprobe::KprobeAuxiliaryOps> {
    symbol: String,
    addr: usize,
    probe: Arc<kprobe::Kprobe<LockType, O>>,
}

impl<O: kprobe::KprobeAuxiliaryOps> KprobeHandle<O> {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn addr(&self) -> usize {
        self.addr
    }
}

/// Interception facility backed by the kprobe library.
///
/// `O` is the host kernel's glue for text patching and instruction slots.
pub struct KprobeFacility<O: kprobe::KprobeAuxiliaryOps> {
    manager: kprobe::ProbeManager<LockType, O>,
    probe_points: kprobe::ProbePointList<O>,
    /// Addresses with an armed probe.
    armed: BTreeSet<usize>,
    capacity: usize,
    lookup: SymbolLookup,
}

impl<O: kprobe::KprobeAuxiliaryOps> KprobeFacility<O> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            manager: kprobe::ProbeManager::new(),
            probe_points: kprobe::ProbePointList::new(),
            armed: BTreeSet::new(),
            capacity,
            lookup: kernel_symbol_lookup,
        }
    }

    /// Resolve targets through `lookup` instead of the kernel symbol table.
    pub fn with_lookup(mut self, lookup: SymbolLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of armed probes.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Probe manager, for the host's breakpoint exception path.
    pub fn manager_mut(&mut self) -> &mut kprobe::ProbeManager<LockType, O> {
        &mut self.manager
    }
}

impl<O: kprobe::KprobeAuxiliaryOps> Default for KprobeFacility<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: kprobe::KprobeAuxiliaryOps> InterceptFacility for KprobeFacility<O> {
    type Handle = KprobeHandle<O>;

    fn attach(&mut self, symbol: &str, hook: ProbeHook) -> Result<KprobeHandle<O>, ProbeError> {
        let addr = (self.lookup)(symbol)? as usize;

        if self.armed.contains(&addr) {
            return Err(ProbeError::AlreadyAttached(symbol.into()));
        }
        if self.armed.len() >= self.capacity {
            return Err(ProbeError::ResourceExhausted);
        }

        let builder = kprobe::ProbeBuilder::<O>::new()
            .with_symbol_addr(addr)
            .with_symbol(String::from(symbol))
            .with_enable(true)
            .with_pre_handler(kprobe_pre_handler)
            .with_data(hook);
        let probe = kprobe::register_kprobe(&mut self.manager, &mut self.probe_points, builder);

        self.armed.insert(addr);
        log::info!("kprobe: armed {} at {:#x}", symbol, addr);

        Ok(KprobeHandle {
            symbol: String::from(symbol),
            addr,
            probe,
        })
    }

    fn detach(&mut self, handle: KprobeHandle<O>) {
        // Returns once the original instruction is restored; the library
        // owns synchronisation with handlers still running elsewhere.
        kprobe::unregister_kprobe(&mut self.manager, &mut self.probe_points, handle.probe);
        self.armed.remove(&handle.addr);
        log::info!("kprobe: disarmed {} at {:#x}", handle.symbol, handle.addr);
    }
}

/// Pre-handler shared by every probe: runs the hook carried as user data.
fn kprobe_pre_handler(data: &dyn kprobe::ProbeData, _pt_regs: &mut kprobe::PtRegs) {
    let Some(hook) = data.as_any().downcast_ref::<ProbeHook>() else {
        return;
    };
    hook.fire();
}
