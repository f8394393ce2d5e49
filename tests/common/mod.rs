//! Shared helpers for integration tests.
//!
//! Installs a `log::Log` implementation that keeps every formatted record so
//! tests can assert on banners, warnings and threshold reports.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct CaptureLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = record.args().to_string();
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((record.level(), line));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Start capturing: serializes log-asserting tests and clears old lines.
///
/// Hold the returned guard for the whole test.
pub fn capture() -> MutexGuard<'static, ()> {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already installed");
        log::set_max_level(LevelFilter::Trace);
    });
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    LOGGER.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    guard
}

/// All captured lines.
pub fn lines() -> Vec<(Level, String)> {
    LOGGER.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Captured lines containing `pattern`, at any level.
pub fn lines_containing(pattern: &str) -> Vec<String> {
    lines()
        .into_iter()
        .filter(|(_, line)| line.contains(pattern))
        .map(|(_, line)| line)
        .collect()
}

pub fn count_containing(pattern: &str) -> usize {
    lines_containing(pattern).len()
}

/// Number of captured lines at exactly `level`.
pub fn count_at(level: Level) -> usize {
    lines().iter().filter(|(l, _)| *l == level).count()
}

/// Values of threshold reports tagged `[tag]`, in log order.
pub fn report_values(tag: &str) -> Vec<u64> {
    let prefix = format!("[{}] ", tag);
    lines()
        .into_iter()
        .filter_map(|(_, line)| {
            let rest = line.strip_prefix(&prefix)?;
            let (_, tail) = rest.split_once(": ")?;
            let (value, _) = tail.split_once(' ')?;
            value.parse().ok()
        })
        .collect()
}

/// Clear captured lines while already holding the [`capture`] guard.
pub fn capture_reset() {
    LOGGER.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
}
