//! Planner, executor, and diff presenter.
//!
//! ```text
//! ProjectContext ─┐
//! Schema ─────────┼─> planner::plan ─> Plan ─┬─> executor::apply ─> ReconcileResult
//! Mode ───────────┘                          └─> diff::render   ─> String
//! ```
//!
//! Both consumers replay the plan's actions through [`staging::Staging`],
//! so a dry run classifies paths exactly as a real run would.
pub mod diff;
pub mod executor;
pub mod planner;
pub mod staging;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::resources::patch::Marker;
use crate::schema::Tier;

pub use executor::apply;
pub use planner::{plan, plan_for_owner};

/// Lifecycle operation a reconciliation pass performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bootstrap into a project.
    Install,
    /// Refresh an installed project.
    Upgrade,
    /// Remove standard-tier artifacts.
    Uninstall,
    /// Remove every artifact, including full-only ones.
    UninstallFull,
}

impl Mode {
    /// Whether this mode removes artifacts.
    #[must_use]
    pub const fn is_removal(self) -> bool {
        matches!(self, Self::Uninstall | Self::UninstallFull)
    }

    /// Whether a removal in this mode processes entries of `tier`.
    #[must_use]
    pub const fn removes(self, tier: Tier) -> bool {
        match self {
            Self::Install | Self::Upgrade => false,
            Self::Uninstall => matches!(tier, Tier::Standard),
            Self::UninstallFull => true,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
            Self::UninstallFull => "uninstall-full",
        })
    }
}

/// One fully evaluated filesystem change.
///
/// Actions are data: the executor and the diff presenter replay the same
/// list without consulting the schema or the context again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write a file that does not exist yet.
    CreateFile {
        /// Relative path.
        path: PathBuf,
        /// Full content.
        content: String,
    },
    /// Overwrite an existing file.
    UpdateFile {
        /// Relative path.
        path: PathBuf,
        /// Full content.
        content: String,
    },
    /// Delete a file.
    DeleteFile {
        /// Relative path.
        path: PathBuf,
    },
    /// Insert a marked region at the top of a file.
    InsertPatch {
        /// Relative path of the host file.
        path: PathBuf,
        /// How the region is located.
        marker: Marker,
        /// Region text.
        text: String,
    },
    /// Replace an existing marked region.
    ReplacePatch {
        /// Relative path of the host file.
        path: PathBuf,
        /// How the region is located.
        marker: Marker,
        /// Region text.
        text: String,
    },
    /// Remove a marked region; the file is deleted if nothing else remains.
    RemovePatch {
        /// Relative path of the host file.
        path: PathBuf,
        /// How the region is located.
        marker: Marker,
    },
    /// Deep-merge a fragment into a JSON document, creating it if absent.
    JsonMerge {
        /// Relative path of the document.
        path: PathBuf,
        /// Fragment to merge.
        fragment: Value,
    },
    /// Remove a fragment's unchanged values from a JSON document.
    JsonUnmerge {
        /// Relative path of the document.
        path: PathBuf,
        /// Fragment to remove.
        fragment: Value,
    },
    /// Set or clear the executable bit.
    Chmod {
        /// Relative path.
        path: PathBuf,
        /// Desired state of the bit.
        executable: bool,
    },
}

impl Action {
    /// Path this action touches.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::CreateFile { path, .. }
            | Self::UpdateFile { path, .. }
            | Self::DeleteFile { path }
            | Self::InsertPatch { path, .. }
            | Self::ReplacePatch { path, .. }
            | Self::RemovePatch { path, .. }
            | Self::JsonMerge { path, .. }
            | Self::JsonUnmerge { path, .. }
            | Self::Chmod { path, .. } => path,
        }
    }

    /// Short verb describing the action.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::CreateFile { .. } => "create",
            Self::UpdateFile { .. } => "update",
            Self::DeleteFile { .. } => "delete",
            Self::InsertPatch { .. } => "insert region in",
            Self::ReplacePatch { .. } => "replace region in",
            Self::RemovePatch { .. } => "remove region from",
            Self::JsonMerge { .. } => "merge into",
            Self::JsonUnmerge { .. } => "unmerge from",
            Self::Chmod {
                executable: true, ..
            } => "chmod +x",
            Self::Chmod {
                executable: false, ..
            } => "chmod -x",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.path().display())
    }
}

/// Output of the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Mode the plan was computed for.
    pub mode: Mode,
    /// Actions in schema-declaration order.
    pub actions: Vec<Action>,
    /// Packages applicable entries need that the project does not declare.
    pub packages_to_install: Vec<String>,
    /// Declared packages only removed entries needed.
    pub packages_to_remove: Vec<String>,
    /// Entry paths skipped because the user excluded them.
    pub excluded: Vec<PathBuf>,
    /// Human-readable notes about artifacts deliberately left alone.
    pub notes: Vec<String>,
}

impl Plan {
    /// An empty plan for `mode`.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            actions: Vec::new(),
            packages_to_install: Vec::new(),
            packages_to_remove: Vec::new(),
            excluded: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Whether the project has converged (no filesystem actions).
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Summary of an executed (or simulated) plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Actions that were applied.
    pub actions: Vec<Action>,
    /// Paths that went from absent to present.
    pub created: Vec<PathBuf>,
    /// Paths whose content or permissions changed.
    pub updated: Vec<PathBuf>,
    /// Paths that went from present to absent.
    pub removed: Vec<PathBuf>,
    /// Packages to install after reconciliation.
    pub packages_to_install: Vec<String>,
    /// Packages to remove after reconciliation.
    pub packages_to_remove: Vec<String>,
}

impl ReconcileResult {
    /// Whether any path changed.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        !(self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

/// Push `item` unless already present, keeping first-seen order.
pub(crate) fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
