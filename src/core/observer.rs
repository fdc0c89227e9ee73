//! Injectable logging capability
//!
//! Every engine in this crate reports progress through an [`Observer`] handed
//! to it by the caller instead of writing to a process-global logger directly.
//! The default observer forwards to the `log` facade, so any `log`-compatible
//! backend installed by the application receives the records.

use log::{Level, LevelFilter};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Default `log` target used by [`LogObserver::default`]
pub const DEFAULT_TARGET: &str = "thicket_agc";

/// Receiver of diagnostic messages emitted by the selection engines
pub trait Observer: Send + Sync {
    /// Record a message at the given level
    fn log(&self, level: Level, message: &str);

    /// Whether messages at `level` would be recorded at all
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}

impl fmt::Debug for dyn Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observer(<dyn>)")
    }
}

/// Observer forwarding to the `log` facade under a fixed target
#[derive(Debug, Clone)]
pub struct LogObserver {
    target: String,
    max_level: LevelFilter,
}

impl LogObserver {
    /// Create a new observer logging under `target`
    pub fn new(target: impl Into<String>) -> Self {
        LogObserver {
            target: target.into(),
            max_level: LevelFilter::Trace,
        }
    }

    /// Drop records more verbose than `level` before they reach `log`
    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    /// The `log` target records are emitted under
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        LogObserver::new(DEFAULT_TARGET)
    }
}

impl Observer for LogObserver {
    fn log(&self, level: Level, message: &str) {
        if level <= self.max_level {
            log::log!(target: self.target.as_str(), level, "{}", message);
        }
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.max_level && log::log_enabled!(target: self.target.as_str(), level)
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn log(&self, _level: Level, _message: &str) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Observer that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemoryObserver {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages in emission order
    pub fn records(&self) -> Vec<(Level, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages only, in emission order
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, msg)| msg).collect()
    }

    /// True if any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|(_, msg)| msg.contains(needle))
    }
}

impl Observer for MemoryObserver {
    fn log(&self, level: Level, message: &str) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((level, message.to_string()));
    }
}

/// Shared handle to the default observer
pub fn default_observer() -> Arc<dyn Observer> {
    Arc::new(LogObserver::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_observer_records_in_order() {
        let observer = MemoryObserver::new();
        observer.info("first");
        observer.warn("second");
        observer.debug("third");

        let records = observer.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], (Level::Info, "first".to_string()));
        assert_eq!(records[1].0, Level::Warn);
        assert!(observer.contains("thi"));
        assert!(!observer.contains("fourth"));
    }

    #[test]
    fn test_null_observer_is_disabled() {
        let observer = NullObserver;
        observer.info("ignored");
        assert!(!observer.enabled(Level::Error));
    }

    #[test]
    fn test_log_observer_target() {
        assert_eq!(LogObserver::default().target(), DEFAULT_TARGET);
        assert_eq!(LogObserver::new("agc").target(), "agc");
    }

    #[test]
    fn test_log_observer_max_level() {
        let observer = LogObserver::new("agc").with_max_level(LevelFilter::Warn);
        assert!(!observer.enabled(Level::Info));
        assert!(!observer.enabled(Level::Debug));
    }
}
