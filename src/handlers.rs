//! Probe handlers.
//!
//! Each one runs on entry to its target symbol, counts the event and lets the
//! threshold logger decide whether to report. None of them touch the probed
//! function's arguments or control flow.

use crate::threshold::ThresholdLogger;

/// `wake_up_new_task`: a new process was created.
pub fn monitor_fork(logger: &ThresholdLogger) {
    logger.record();
}

/// `do_sys_open`
pub fn monitor_open(logger: &ThresholdLogger) {
    logger.record();
}

/// `do_execve`
pub fn monitor_execve(logger: &ThresholdLogger) {
    logger.record();
}

/// `vfs_read`
pub fn monitor_file_read(logger: &ThresholdLogger) {
    logger.record();
}
