//! File-system helpers shared by the executor.
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ReconcileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReconcileError::io("create directory", parent, e))?;
    }
    Ok(())
}

/// Remove the file at `path`.  Does nothing if it does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<(), ReconcileError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReconcileError::io("remove", path, e)),
    }
}

/// Remove `dir` and its ancestors while they are empty, stopping at `root`.
///
/// `root` itself is never removed, nor is any directory outside it.  Returns
/// the directories that were removed, deepest first.
///
/// # Errors
///
/// Returns an error if an empty directory cannot be removed.
pub fn prune_empty_dirs(root: &Path, dir: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let mut removed = Vec::new();
    let mut current = Some(dir);
    while let Some(candidate) = current {
        if candidate == root || !candidate.starts_with(root) {
            break;
        }
        let is_empty = match std::fs::read_dir(candidate) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                current = candidate.parent();
                continue;
            }
            Err(e) => return Err(ReconcileError::io("read directory", candidate, e)),
        };
        if !is_empty {
            break;
        }
        std::fs::remove_dir(candidate)
            .map_err(|e| ReconcileError::io("remove directory", candidate, e))?;
        removed.push(candidate.to_path_buf());
        current = candidate.parent();
    }
    Ok(removed)
}
