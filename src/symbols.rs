//! Kernel symbol table.
//!
//! Resolves probe target names to addresses from a kallsyms blob. Must be
//! initialized once at boot before any kprobe-backed monitor loads.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};
use ksym::KallsymsMapped;

const UNINIT: u8 = 0;
/// An `init` call owns the table and is writing it.
const BUSY: u8 = 1;
const READY: u8 = 2;

static STATE: AtomicU8 = AtomicU8::new(UNINIT);

struct GlobalSymbolTable(UnsafeCell<Option<KallsymsMapped<'static>>>);
// Only the `init` call that moved STATE from UNINIT to BUSY writes the table,
// and readers touch it only after observing READY.
unsafe impl Sync for GlobalSymbolTable {}
static SYMBOL_TABLE: GlobalSymbolTable = GlobalSymbolTable(UnsafeCell::new(None));

/// Error types for symbol operations.
#[derive(Debug)]
pub enum Error {
    /// Symbol table has already been initialized.
    AlreadyInitialized,
    /// Failed to parse the symbol table blob.
    ParseError(&'static str),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "Symbol table already initialized"),
            Self::ParseError(e) => write!(f, "Failed to parse symbol table: {}", e),
        }
    }
}

impl core::error::Error for Error {}

/// Load the symbol table from a kallsyms blob.
///
/// `stext`/`etext` bound the kernel text section. Concurrent callers race
/// for the table: exactly one parses it, the rest get
/// [`Error::AlreadyInitialized`]. A blob that fails to parse releases the
/// table so a later call can retry.
pub fn init(data: &'static [u8], stext: u64, etext: u64) -> Result<(), Error> {
    if STATE
        .compare_exchange(UNINIT, BUSY, Ordering::Acquire, Ordering::Acquire)
        .is_err()
    {
        return Err(Error::AlreadyInitialized);
    }

    let table = match KallsymsMapped::from_blob(data, stext, etext) {
        Ok(table) => table,
        Err(e) => {
            STATE.store(UNINIT, Ordering::Release);
            return Err(Error::ParseError(e));
        }
    };

    unsafe {
        *SYMBOL_TABLE.0.get() = Some(table);
    }
    STATE.store(READY, Ordering::Release);
    log::info!("symbols: loaded {} bytes, text {:#x}-{:#x}", data.len(), stext, etext);

    Ok(())
}

pub fn is_initialized() -> bool {
    STATE.load(Ordering::Acquire) == READY
}

/// Address of `name`, or `None` if the table is not loaded or lacks it.
pub fn lookup_addr(name: &str) -> Option<u64> {
    if !is_initialized() {
        return None;
    }
    let table = unsafe { (*SYMBOL_TABLE.0.get()).as_ref() }?;
    table.lookup_name(name)
}
