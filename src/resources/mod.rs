//! Per-kind state primitives (check current state against desired state).
//!
//! Every managed entry kind has a resource type here that knows how to read
//! its slice of the project through a [`FileSystemView`] and classify it as
//! a [`ResourceState`].  The pure text and JSON transformations the executor
//! replays also live here, so planning and applying share one definition of
//! what "converged" means.
pub mod chmod;
pub mod file;
pub mod fs;
pub mod json;
pub mod patch;

use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// State of a managed artifact relative to its desired state.
///
/// # Examples
///
/// ```
/// use warden_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "content differs".into() };
///
/// assert_ne!(missing, correct);
/// assert!(wrong.needs_change());
/// assert!(!correct.needs_change());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// The artifact does not exist.
    Missing,
    /// The artifact exists and matches the desired state.
    Correct,
    /// The artifact exists but does not match the desired state.
    Incorrect {
        /// Short description of the current value.
        current: String,
    },
    /// The artifact cannot be reconciled (e.g., its host file is absent).
    Invalid {
        /// Reason the artifact cannot be reconciled.
        reason: String,
    },
}

impl ResourceState {
    /// Whether converging this artifact requires an action.
    #[must_use]
    pub const fn needs_change(&self) -> bool {
        matches!(self, Self::Missing | Self::Incorrect { .. })
    }
}

/// A managed artifact whose state can be inspected through a view.
pub trait Resource {
    /// Classify the artifact's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be read or parsed.
    fn current_state(&self, view: &dyn FileSystemView) -> Result<ResourceState, ReconcileError>;
}

/// Normalise text for comparison: strip trailing whitespace from every line
/// and drop trailing blank lines.
///
/// ```
/// use warden_cli::resources::normalize;
///
/// assert_eq!(normalize("a  \nb\t\n\n"), "a\nb");
/// assert_eq!(normalize("a\r\nb"), "a\nb");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end().to_string()
}

/// Whether two texts are equal after [`normalize`].
#[must_use]
pub fn same_text(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
