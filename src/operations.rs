//! Read-only filesystem views for dependency injection.
//!
//! The planner and the diff presenter only ever *read* the project through
//! the [`FileSystemView`] trait, so both can be unit-tested against an
//! in-memory tree.  Production code uses [`DiskView`]; tests use
//! `MemoryView`.  All paths are relative to the project root.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;

/// Read-only access to the files of one project.
pub trait FileSystemView: std::fmt::Debug {
    /// Read a text file, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the path exists but cannot be read as UTF-8 text.
    fn read(&self, path: &Path) -> Result<Option<String>, ReconcileError>;

    /// Whether the file is executable, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    fn executable(&self, path: &Path) -> Result<Option<bool>, ReconcileError>;

    /// Whether anything exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected.
    fn exists(&self, path: &Path) -> Result<bool, ReconcileError> {
        Ok(self.read(path)?.is_some())
    }
}

/// Production [`FileSystemView`] rooted at a project directory.
#[derive(Debug, Clone)]
pub struct DiskView {
    root: PathBuf,
}

impl DiskView {
    /// Create a view of the project at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSystemView for DiskView {
    fn read(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        match std::fs::read_to_string(self.root.join(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReconcileError::io("read", path, e)),
        }
    }

    fn executable(&self, path: &Path) -> Result<Option<bool>, ReconcileError> {
        match std::fs::metadata(self.root.join(path)) {
            Ok(meta) => Ok(Some(crate::resources::chmod::is_executable(&meta))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReconcileError::io("stat", path, e)),
        }
    }

    fn exists(&self, path: &Path) -> Result<bool, ReconcileError> {
        Ok(self.root.join(path).symlink_metadata().is_ok())
    }
}

/// In-memory [`FileSystemView`] for unit tests.
///
/// # Example
///
/// ```ignore
/// let fs = MemoryView::new()
///     .with_file("DOC.md", "# Title\nBody")
///     .with_executable("hooks/run.sh", "#!/bin/sh\n");
/// ```
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryView {
    files: std::collections::HashMap<PathBuf, (String, bool)>,
}

#[cfg(test)]
impl MemoryView {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular, non-executable file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), (content.to_string(), false));
        self
    }

    /// Add an executable file.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), (content.to_string(), true));
        self
    }
}

#[cfg(test)]
impl FileSystemView for MemoryView {
    fn read(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        Ok(self.files.get(path).map(|(content, _)| content.clone()))
    }

    fn executable(&self, path: &Path) -> Result<Option<bool>, ReconcileError> {
        Ok(self.files.get(path).map(|(_, exec)| *exec))
    }
}
