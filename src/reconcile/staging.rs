//! In-memory overlay that replays actions over a read-only view.
//!
//! The planner stages each action it emits so later entries observe the
//! effect of earlier ones.  The executor and the diff presenter replay a
//! finished action list through the same overlay and then read the
//! per-file before/after pairs back out.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::Action;
use crate::error::ReconcileError;
use crate::operations::FileSystemView;
use crate::resources::{json, patch};

#[derive(Debug, Clone)]
struct StagedFile {
    original: Option<String>,
    original_executable: Option<bool>,
    content: Option<String>,
    executable: Option<bool>,
}

/// Before and after state of one touched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    /// Relative path.
    pub path: PathBuf,
    /// Content before the actions, `None` if absent.
    pub before: Option<String>,
    /// Content after the actions, `None` if absent.
    pub after: Option<String>,
    /// Executable bit before the actions.
    pub executable_before: Option<bool>,
    /// Executable bit after the actions.
    pub executable_after: Option<bool>,
}

impl StagedChange {
    /// The file went from absent to present.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    /// The file went from present to absent.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    /// Content changed.
    #[must_use]
    pub fn content_changed(&self) -> bool {
        self.before != self.after
    }

    /// The executable bit changed on a file that exists afterwards.
    #[must_use]
    pub fn mode_changed(&self) -> bool {
        self.after.is_some() && self.executable_before != self.executable_after
    }

    /// Nothing observable changed.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        !self.content_changed() && !self.mode_changed()
    }
}

/// Copy-on-touch overlay over a [`FileSystemView`].
#[derive(Debug)]
pub struct Staging<'a> {
    base: &'a dyn FileSystemView,
    files: HashMap<PathBuf, StagedFile>,
    order: Vec<PathBuf>,
}

impl<'a> Staging<'a> {
    /// Create an overlay with nothing staged.
    #[must_use]
    pub fn new(base: &'a dyn FileSystemView) -> Self {
        Self {
            base,
            files: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn touch(&mut self, path: &Path) -> Result<&mut StagedFile, ReconcileError> {
        match self.files.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let original = self.base.read(path)?;
                let original_executable = self.base.executable(path)?;
                self.order.push(path.to_path_buf());
                Ok(entry.insert(StagedFile {
                    content: original.clone(),
                    executable: original_executable,
                    original,
                    original_executable,
                }))
            }
        }
    }

    /// Apply one action to the overlay.
    ///
    /// Applying is idempotent: inserting a region that is already present
    /// replaces it, and removing something absent does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a base file cannot be read, a JSON document cannot
    /// be parsed, or the action targets a file that does not exist.
    pub fn apply(&mut self, action: &Action) -> Result<(), ReconcileError> {
        let path = action.path().to_path_buf();
        let file = self.touch(&path)?;
        match action {
            Action::CreateFile { content, .. } | Action::UpdateFile { content, .. } => {
                file.executable.get_or_insert(false);
                file.content = Some(content.clone());
            }
            Action::DeleteFile { .. } => {
                file.content = None;
                file.executable = None;
            }
            Action::InsertPatch { marker, text, .. } | Action::ReplacePatch { marker, text, .. } => {
                let Some(current) = &file.content else {
                    return Err(ReconcileError::MissingPatchTarget {
                        path,
                        marker: marker.start.clone(),
                    });
                };
                file.content = Some(patch::upsert(current, marker, text));
            }
            Action::RemovePatch { marker, .. } => {
                if let Some(rest) = file.content.as_deref().and_then(|c| patch::strip(c, marker)) {
                    if rest.trim().is_empty() {
                        file.content = None;
                        file.executable = None;
                    } else {
                        file.content = Some(rest);
                    }
                }
            }
            Action::JsonMerge { fragment, .. } => {
                let mut doc = json::parse_document(&path, file.content.as_deref())?;
                json::merge(&mut doc, fragment);
                file.executable.get_or_insert(false);
                file.content = Some(restore_or_render(
                    &path,
                    file.original.as_deref(),
                    file.content.as_deref(),
                    &doc,
                ));
            }
            Action::JsonUnmerge { fragment, .. } => {
                if file.content.is_some() {
                    let mut doc = json::parse_document(&path, file.content.as_deref())?;
                    if json::unmerge(&mut doc, fragment) {
                        if json::is_empty_document(&doc) {
                            file.content = None;
                            file.executable = None;
                        } else {
                            file.content = Some(restore_or_render(
                                &path,
                                file.original.as_deref(),
                                file.content.as_deref(),
                                &doc,
                            ));
                        }
                    }
                }
            }
            Action::Chmod { executable, .. } => {
                if file.content.is_none() {
                    return Err(ReconcileError::MissingChmodTarget { path });
                }
                file.executable = Some(*executable);
            }
        }
        Ok(())
    }

    /// Apply every action in order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Staging::apply`].
    pub fn apply_all(&mut self, actions: &[Action]) -> Result<(), ReconcileError> {
        actions.iter().try_for_each(|action| self.apply(action))
    }

    /// Touched files in first-touch order.
    #[must_use]
    pub fn changes(&self) -> Vec<StagedChange> {
        self.order
            .iter()
            .filter_map(|path| {
                self.files.get(path).map(|file| StagedChange {
                    path: path.clone(),
                    before: file.original.clone(),
                    after: file.content.clone(),
                    executable_before: file.original_executable,
                    executable_after: file.executable,
                })
            })
            .collect()
    }
}

/// Content of `path` after replaying `actions` over a tree holding only
/// `seed` at `path`.
///
/// # Errors
///
/// Returns an error if an action cannot be applied to the seeded file.
pub fn compose(
    path: &Path,
    seed: &str,
    actions: &[Action],
) -> Result<Option<String>, ReconcileError> {
    let base = Seed { path, content: seed };
    let mut staging = Staging::new(&base);
    staging.apply_all(actions)?;
    staging.read(path)
}

/// A view containing exactly one file.
#[derive(Debug)]
struct Seed<'a> {
    path: &'a Path,
    content: &'a str,
}

impl FileSystemView for Seed<'_> {
    fn read(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        Ok((path == self.path).then(|| self.content.to_string()))
    }

    fn executable(&self, path: &Path) -> Result<Option<bool>, ReconcileError> {
        Ok((path == self.path).then_some(false))
    }
}

/// Keep the user's original bytes when the document is semantically back to
/// where it started; otherwise render it in the layout of `current`.
fn restore_or_render(
    path: &Path,
    original: Option<&str>,
    current: Option<&str>,
    doc: &Value,
) -> String {
    if let Some(text) = original
        && json::parse_document(path, Some(text)).is_ok_and(|before| before == *doc)
    {
        return text.to_string();
    }
    json::JsonStyle::detect(current).render(doc)
}

impl FileSystemView for Staging<'_> {
    fn read(&self, path: &Path) -> Result<Option<String>, ReconcileError> {
        match self.files.get(path) {
            Some(file) => Ok(file.content.clone()),
            None => self.base.read(path),
        }
    }

    fn executable(&self, path: &Path) -> Result<Option<bool>, ReconcileError> {
        match self.files.get(path) {
            Some(file) => Ok(file.executable),
            None => self.base.executable(path),
        }
    }

    fn exists(&self, path: &Path) -> Result<bool, ReconcileError> {
        match self.files.get(path) {
            Some(file) => Ok(file.content.is_some()),
            None => self.base.exists(path),
        }
    }
}
