//! The logging capability handed to a compile.

use std::sync::Mutex;

use crate::address::Address;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub address: Address,
    pub message: String,
}

pub trait CompileLog: Sync {
    fn log(&self, entry: LogEntry);
}

/// Forwards entries to `tracing`.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingLog;

impl CompileLog for TracingLog {
    fn log(&self, entry: LogEntry) {
        match entry.severity {
            Severity::Debug => tracing::debug!(address = %entry.address, "{}", entry.message),
            Severity::Warning => tracing::warn!(address = %entry.address, "{}", entry.message),
        }
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct CollectingLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl CollectingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.severity == Severity::Warning)
            .collect()
    }
}

impl CompileLog for CollectingLog {
    fn log(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
