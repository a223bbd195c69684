//! Domain-specific error types for the reconciliation engine.
//!
//! Internal modules return typed errors (e.g., [`ReconcileError`],
//! [`ConfigError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! WardenError
//! ├── Reconcile(ReconcileError): planning, applying, lifecycle guards
//! ├── Schema(SchemaError):       schema authoring defects
//! └── Config(ConfigError):       warden.toml loading
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the engine.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Planning or applying a reconciliation pass failed.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// The schema failed validation.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The project configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the lifecycle guard, the planner, and the executor.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Upgrade or uninstall was requested but nothing is installed.
    #[error("nothing is installed in {root}: run `warden install` first")]
    MissingPrerequisite {
        /// Project root that was inspected.
        root: PathBuf,
    },

    /// The project was converged by a newer schema than this binary carries.
    #[error("installed version {installed} is newer than this schema ({schema}); refusing to downgrade")]
    VersionConflict {
        /// Version recorded in the project's version marker.
        installed: semver::Version,
        /// Version of the schema compiled into this binary.
        schema: semver::Version,
    },

    /// A text patch targets a file that does not exist.
    #[error("patch target {path} does not exist (marker '{marker}')")]
    MissingPatchTarget {
        /// Relative path of the missing file.
        path: PathBuf,
        /// Marker the patch would have inserted.
        marker: String,
    },

    /// A permission entry targets a file that does not exist.
    #[error("chmod target {path} does not exist")]
    MissingChmodTarget {
        /// Relative path of the missing file.
        path: PathBuf,
    },

    /// A managed document could not be parsed.
    #[error("cannot parse {path}: {message}")]
    InvalidDocument {
        /// Relative path of the unparseable document.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("{action} {path}: {source}")]
    FileSystem {
        /// What was being attempted (e.g., `"write"`).
        action: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Installing or removing external packages failed.
    #[error("{manager} could not {verb} {}: {reason}", .packages.join(", "))]
    ExternalDependencyFailure {
        /// Package manager that was invoked.
        manager: String,
        /// `"install"` or `"remove"`.
        verb: &'static str,
        /// Packages that were requested.
        packages: Vec<String>,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ReconcileError {
    /// Wrap an I/O error with the action and path it occurred on.
    #[must_use]
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors describing a defective schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// One or more entries failed validation.
    #[error("schema validation failed with {count} problem(s); first: {first}")]
    Invalid {
        /// Number of problems found.
        count: usize,
        /// The first problem, for display.
        first: String,
    },
}

/// Errors that arise from loading `warden.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected shape.
    #[error("Invalid TOML in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser error message.
        message: String,
    },

    /// `package_manager` names a manager the engine does not know.
    #[error("Unknown package manager '{0}': must be one of npm, pnpm, yarn, bun")]
    UnknownPackageManager(String),
}
