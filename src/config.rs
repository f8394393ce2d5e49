//! Built-in monitor profiles.
//!
//! Monitoring policy is fixed at compile time: which symbols each module
//! probes, which counter every probe feeds, and how often a counter reports.

use core::num::NonZeroU64;

use crate::handlers::{monitor_execve, monitor_file_read, monitor_fork, monitor_open};
use crate::probe::ProbeHandler;

/// Process creation events between two reports.
pub const PROCESS_REPORT_INTERVAL: NonZeroU64 = interval(50);
/// Syscall events (open + execve) between two reports.
pub const SYSCALL_REPORT_INTERVAL: NonZeroU64 = interval(100);
/// File read events between two reports.
pub const FILE_READ_REPORT_INTERVAL: NonZeroU64 = interval(100);

/// Kernel entry point run when a new task is first scheduled.
pub const SYM_PROCESS_CREATE: &str = "wake_up_new_task";
pub const SYM_FILE_OPEN: &str = "do_sys_open";
pub const SYM_PROGRAM_EXEC: &str = "do_execve";
pub const SYM_FILE_READ: &str = "vfs_read";

/// Every symbol probed by the built-in profiles.
pub const KERNEL_SYMBOLS: &[&str] = &[
    SYM_PROCESS_CREATE,
    SYM_FILE_OPEN,
    SYM_PROGRAM_EXEC,
    SYM_FILE_READ,
];

const fn interval(n: u64) -> NonZeroU64 {
    match NonZeroU64::new(n) {
        Some(n) => n,
        None => panic!("report interval must be non-zero"),
    }
}

/// Module metadata shown in the load banner.
#[derive(Debug, Clone, Copy)]
pub struct ModuleInfo {
    pub description: &'static str,
    pub author: &'static str,
    pub license: &'static str,
    pub version: &'static str,
}

/// One counter of a monitor and how it is reported.
#[derive(Debug, Clone, Copy)]
pub struct CounterSpec {
    /// Counter name in the bank.
    pub name: &'static str,
    /// Prefix of threshold reports.
    pub tag: &'static str,
    /// Event category in threshold reports.
    pub report_label: &'static str,
    /// Line prefix in the unload summary.
    pub summary_label: &'static str,
    pub interval: NonZeroU64,
}

/// One probe of a monitor.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSpec {
    pub symbol: &'static str,
    /// Name of the counter the handler feeds.
    pub counter: &'static str,
    pub handler: ProbeHandler,
    pub description: &'static str,
}

/// Static description of a monitor module.
#[derive(Debug)]
pub struct MonitorProfile {
    pub name: &'static str,
    pub info: ModuleInfo,
    pub counters: &'static [CounterSpec],
    /// Probes in registration order.
    pub probes: &'static [ProbeSpec],
}

impl MonitorProfile {
    pub fn counter(&self, name: &str) -> Option<&CounterSpec> {
        self.counters.iter().find(|c| c.name == name)
    }
}

/// Watches process creation.
pub static PROCESS_GUARD: MonitorProfile = MonitorProfile {
    name: "Process Guard",
    info: ModuleInfo {
        description: "Process Security Monitoring",
        author: "Android Security Team",
        license: "GPL",
        version: "1.0",
    },
    counters: &[CounterSpec {
        name: "processes",
        tag: "PROC_GUARD",
        report_label: "process creations",
        summary_label: "Total processes monitored",
        interval: PROCESS_REPORT_INTERVAL,
    }],
    probes: &[ProbeSpec {
        symbol: SYM_PROCESS_CREATE,
        counter: "processes",
        handler: monitor_fork,
        description: "process creation",
    }],
};

/// Watches open, execve and file reads. Open and execve share one counter.
pub static SYSCALL_MONITOR: MonitorProfile = MonitorProfile {
    name: "Syscall Monitor",
    info: ModuleInfo {
        description: "System Call Monitoring for Security",
        author: "Android Security Team",
        license: "GPL",
        version: "1.0",
    },
    counters: &[
        CounterSpec {
            name: "syscalls",
            tag: "SECURITY",
            report_label: "syscalls",
            summary_label: "Total syscalls monitored",
            interval: SYSCALL_REPORT_INTERVAL,
        },
        CounterSpec {
            name: "file_reads",
            tag: "FILE_READ",
            report_label: "file reads",
            summary_label: "Total file reads",
            interval: FILE_READ_REPORT_INTERVAL,
        },
    ],
    probes: &[
        ProbeSpec {
            symbol: SYM_FILE_OPEN,
            counter: "syscalls",
            handler: monitor_open,
            description: "open() syscall",
        },
        ProbeSpec {
            symbol: SYM_PROGRAM_EXEC,
            counter: "syscalls",
            handler: monitor_execve,
            description: "execve() syscall",
        },
        ProbeSpec {
            symbol: SYM_FILE_READ,
            counter: "file_reads",
            handler: monitor_file_read,
            description: "file reads",
        },
    ],
};
