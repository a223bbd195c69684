use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

use super::{EntryKind, ManagedEntry, Schema};
use crate::context::ProjectContext;
use crate::error::SchemaError;

/// An authoring defect found in a schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProblem {
    /// The entry that triggered the problem (e.g., `text-patch CLAUDE.md`).
    pub item: String,
    /// Human-readable problem description.
    pub message: String,
}

impl ValidationProblem {
    #[must_use]
    fn new(entry: &ManagedEntry, message: impl Into<String>) -> Self {
        Self {
            item: entry.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

impl Schema {
    /// Check every entry for authoring defects, rendering generated content
    /// against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] when any problem is found.
    pub fn validate(&self, ctx: &ProjectContext) -> Result<(), SchemaError> {
        let problems = problems(self, ctx);
        match problems.first() {
            None => Ok(()),
            Some(first) => Err(SchemaError::Invalid {
                count: problems.len(),
                first: first.to_string(),
            }),
        }
    }
}

/// Collect every authoring defect in `schema`.
#[must_use]
pub fn problems(schema: &Schema, ctx: &ProjectContext) -> Vec<ValidationProblem> {
    let mut found = Vec::new();
    let mut whole_files = HashSet::new();

    for entry in &schema.entries {
        if entry.owner.trim().is_empty() {
            found.push(ValidationProblem::new(entry, "owner tag is empty"));
        }
        if let Some(message) = path_problem(&entry.path) {
            found.push(ValidationProblem::new(entry, message));
        }

        match &entry.kind {
            EntryKind::WriteFile { .. } => {
                if !whole_files.insert(entry.path.clone()) {
                    found.push(ValidationProblem::new(
                        entry,
                        "another write-file entry already owns this path",
                    ));
                }
            }
            EntryKind::TextPatch { marker, text } => {
                let text = text.resolve(ctx);
                if marker.start.is_empty() {
                    found.push(ValidationProblem::new(entry, "marker is empty"));
                } else if marker.region(&text).is_none() {
                    found.push(ValidationProblem::new(
                        entry,
                        format!("region text does not contain marker '{}'", marker.start),
                    ));
                }
                match &marker.end {
                    Some(end) if !text.contains(end.as_str()) => {
                        found.push(ValidationProblem::new(
                            entry,
                            format!("region text does not contain end marker '{end}'"),
                        ));
                    }
                    None if text.trim_end().contains('\n') => {
                        found.push(ValidationProblem::new(
                            entry,
                            "multi-line region needs an end marker",
                        ));
                    }
                    _ => {}
                }
            }
            EntryKind::JsonMerge { fragment } => {
                if !fragment.resolve(ctx).is_object() {
                    found.push(ValidationProblem::new(entry, "fragment must be a JSON object"));
                }
            }
            EntryKind::Chmod { .. } => {}
        }
    }

    found
}

fn path_problem(path: &Path) -> Option<&'static str> {
    if path.as_os_str().is_empty() {
        return Some("path is empty");
    }
    if path.is_absolute() || path.has_root() {
        return Some("path must be relative to the project root");
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Some("path must not escape the project root");
    }
    None
}
