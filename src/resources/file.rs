//! Whole-file resource.
use std::path::PathBuf;

use super::{Resource, ResourceState, same_text};
use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// Prefix of the signature line generated files carry to identify their owner.
pub const SIGNATURE_PREFIX: &str = "managed-by: ";

/// A file whose entire content is owned by one entry.
#[derive(Debug, Clone)]
pub struct FileResource {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Desired content.
    pub content: String,
}

impl FileResource {
    /// Create a new whole-file resource.
    #[must_use]
    pub const fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    /// Whether `current` is still recognisably this tool's file: either it
    /// matches the desired content or it carries `owner`'s signature.
    #[must_use]
    pub fn is_recognized(&self, current: &str, owner: &str) -> bool {
        same_text(current, &self.content) || carries_signature(current, owner)
    }
}

impl Resource for FileResource {
    fn current_state(&self, view: &dyn FileSystemView) -> Result<ResourceState, ReconcileError> {
        Ok(match view.read(&self.path)? {
            None => ResourceState::Missing,
            Some(current) if same_text(&current, &self.content) => ResourceState::Correct,
            Some(_) => ResourceState::Incorrect {
                current: "content differs".to_string(),
            },
        })
    }
}

/// Signature text for `owner` (e.g. `managed-by: warden`).
#[must_use]
pub fn signature(owner: &str) -> String {
    format!("{SIGNATURE_PREFIX}{owner}")
}

/// Whether `content` contains `owner`'s signature as a whole word.
///
/// `managed-by: warden` does not match inside `managed-by: warden-python`.
#[must_use]
pub fn carries_signature(content: &str, owner: &str) -> bool {
    let needle = signature(owner);
    content.match_indices(&needle).any(|(at, _)| {
        content
            .get(at + needle.len()..)
            .and_then(|rest| rest.chars().next())
            .is_none_or(|c| !(c.is_alphanumeric() || c == '-' || c == '_'))
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::MemoryView;

    fn notes() -> FileResource {
        FileResource::new(PathBuf::from("NOTES.md"), "# Notes\n".to_string())
    }

    #[test]
    fn missing_when_absent() {
        let view = MemoryView::new();
        assert_eq!(
            notes().current_state(&view).unwrap(),
            ResourceState::Missing
        );
    }

    #[test]
    fn correct_ignores_trailing_whitespace() {
        let view = MemoryView::new().with_file("NOTES.md", "# Notes   \n\n");
        assert_eq!(
            notes().current_state(&view).unwrap(),
            ResourceState::Correct
        );
    }

    #[test]
    fn incorrect_when_content_differs() {
        let view = MemoryView::new().with_file("NOTES.md", "# Other\n");
        assert!(matches!(
            notes().current_state(&view).unwrap(),
            ResourceState::Incorrect { .. }
        ));
    }

    #[test]
    fn recognized_by_content_or_signature() {
        let resource = notes();
        assert!(resource.is_recognized("# Notes", "warden"));
        assert!(resource.is_recognized("<!-- managed-by: warden -->\nedited", "warden"));
        assert!(!resource.is_recognized("completely rewritten", "warden"));
    }

    #[test]
    fn signature_requires_word_boundary() {
        assert!(carries_signature("# managed-by: warden\n", "warden"));
        assert!(carries_signature("# managed-by: warden", "warden"));
        assert!(!carries_signature("# managed-by: warden-python\n", "warden"));
        assert!(carries_signature(
            "# managed-by: warden-python\n",
            "warden-python"
        ));
    }
}
