//! The [`Log`] trait and an in-memory test implementation.

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) routes messages through `tracing`;
/// tests substitute an in-memory recorder so executor and command code can
/// be exercised without a global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}

/// Severity of a recorded message.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Stage,
    Info,
    Debug,
    Warn,
    Error,
    DryRun,
}

/// [`Log`] implementation that keeps every message in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: std::sync::Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemoryLog {
    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push((level, msg.to_string()));
        }
    }

    /// All recorded messages.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Number of dry-run messages.
    pub fn dry_run_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|(level, _)| *level == Level::DryRun)
            .count()
    }

    /// Whether any message at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

#[cfg(test)]
impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(Level::Stage, msg);
    }
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }
    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }
    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push(Level::DryRun, msg);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_records_levels_in_order() {
        let log = MemoryLog::default();
        log.stage("Planning");
        log.dry_run("would create NOTES.md");
        log.warn("careful");
        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (Level::Stage, "Planning".to_string()));
        assert_eq!(log.dry_run_count(), 1);
        assert!(log.contains(Level::Warn, "care"));
        assert!(!log.contains(Level::Error, "care"));
    }

    #[test]
    fn memory_log_usable_as_trait_object() {
        let log = MemoryLog::default();
        let log_ref: &dyn Log = &log;
        log_ref.info("via trait");
        assert!(log.contains(Level::Info, "via trait"));
    }
}
