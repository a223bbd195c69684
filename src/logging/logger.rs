//! Structured logger with dry-run awareness and a run summary.
use std::path::PathBuf;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::Log;
use super::utils::log_file_path;
use crate::reconcile::ReconcileResult;

/// Implement the methods of [`Log`] by delegating to inherent methods of the
/// same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness.
///
/// All messages are always written to a run log at
/// `$XDG_CACHE_HOME/warden/<command>.log` (`$WARDEN_LOG_DIR` overrides the
/// directory) with timestamps and ANSI codes stripped, regardless of the
/// verbose flag.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary.  The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    #[cfg(test)]
    pub(super) const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Print the summary of a reconciliation run.
    pub fn print_summary(&self, result: &ReconcileResult, dry_run: bool) {
        self.stage("Summary");
        if result.has_changes() {
            let prefix = if dry_run { "would be " } else { "" };
            for (label, paths, color) in [
                ("created", &result.created, "\x1b[32m"),
                ("updated", &result.updated, "\x1b[33m"),
                ("removed", &result.removed, "\x1b[31m"),
            ] {
                for path in paths {
                    self.info(&format!("{color}{prefix}{label}\x1b[0m {}", path.display()));
                }
            }
            self.info(&format!(
                "{} created, {} updated, {} removed",
                result.created.len(),
                result.updated.len(),
                result.removed.len()
            ));
        } else {
            self.info("already up to date");
        }

        if !result.packages_to_install.is_empty() {
            self.info(&format!(
                "packages to install: {}",
                result.packages_to_install.join(", ")
            ));
        }
        if !result.packages_to_remove.is_empty() {
            self.info(&format!(
                "packages to remove: {}",
                result.packages_to_remove.join(", ")
            ));
        }

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);
}
