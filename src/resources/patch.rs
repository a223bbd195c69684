//! Marker-delimited text regions inside user-owned files.
//!
//! A region starts at the first line that begins with its marker (leading
//! indentation ignored).  Without an end marker it is exactly that line; with
//! one it runs through the first later line beginning with the end marker.  Regions always cover whole lines, so
//! inserting and removing one restores the surrounding bytes exactly.
use std::ops::Range;
use std::path::PathBuf;

use super::{Resource, ResourceState, same_text};
use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// How a region is located inside its host file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Prefix identifying the region's first line.
    pub start: String,
    /// Prefix identifying the region's last line, for multi-line regions.
    pub end: Option<String>,
}

impl Marker {
    /// A single-line region identified by `start`.
    #[must_use]
    pub fn line(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    /// A multi-line region running from `start` to `end`.
    #[must_use]
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// Byte range of the region in `content`, including the trailing newline
    /// of its last line.
    #[must_use]
    pub fn locate(&self, content: &str) -> Option<Range<usize>> {
        let mut offset = 0;
        let lines: Vec<(usize, &str)> = content
            .split_inclusive('\n')
            .map(|line| {
                let start = offset;
                offset += line.len();
                (start, line)
            })
            .collect();

        let first = lines
            .iter()
            .position(|(_, line)| opens_with(line, &self.start))?;
        let last = self.end.as_deref().map_or(first, |end| {
            lines
                .iter()
                .enumerate()
                .skip(first + 1)
                .find(|(_, (_, line))| opens_with(line, end))
                .map_or(first, |(i, _)| i)
        });

        let (start, _) = lines.get(first)?;
        let (last_start, last_line) = lines.get(last)?;
        Some(*start..last_start + last_line.len())
    }

    /// Text of the region without its trailing line break.
    #[must_use]
    pub fn region<'a>(&self, content: &'a str) -> Option<&'a str> {
        let range = self.locate(content)?;
        content.get(range).map(trim_line_break)
    }
}

/// Insert `text` as the first line(s) of `content`.
///
/// ```
/// use warden_cli::resources::patch::insert_at_top;
///
/// assert_eq!(insert_at_top("# Title\nBody", "LINK: x"), "LINK: x\n# Title\nBody");
/// ```
#[must_use]
pub fn insert_at_top(content: &str, text: &str) -> String {
    let text = trim_line_break(text);
    let mut out = String::with_capacity(text.len() + 1 + content.len());
    out.push_str(text);
    out.push('\n');
    out.push_str(content);
    out
}

/// Replace the region located by `marker` with `text`, inserting it at the
/// top when the marker is absent.
#[must_use]
pub fn upsert(content: &str, marker: &Marker, text: &str) -> String {
    let Some(range) = marker.locate(content) else {
        return insert_at_top(content, text);
    };
    let before = content.get(..range.start).unwrap_or_default();
    let region = content.get(range.clone()).unwrap_or_default();
    let after = content.get(range.end..).unwrap_or_default();

    let mut out = String::with_capacity(content.len() + text.len());
    out.push_str(before);
    out.push_str(trim_line_break(text));
    if region.ends_with('\n') {
        out.push_str(if region.ends_with("\r\n") { "\r\n" } else { "\n" });
    }
    out.push_str(after);
    out
}

/// Remove the region located by `marker`, or `None` when it is absent.
#[must_use]
pub fn strip(content: &str, marker: &Marker) -> Option<String> {
    let range = marker.locate(content)?;
    let before = content.get(..range.start).unwrap_or_default();
    let after = content.get(range.end..).unwrap_or_default();
    Some(format!("{before}{after}"))
}

fn opens_with(line: &str, marker: &str) -> bool {
    line.trim_start().starts_with(marker)
}

fn trim_line_break(text: &str) -> &str {
    text.strip_suffix('\n')
        .map_or(text, |t| t.strip_suffix('\r').unwrap_or(t))
}

/// A marked region inside a file the user also edits.
#[derive(Debug, Clone)]
pub struct PatchResource {
    /// Host file path relative to the project root.
    pub path: PathBuf,
    /// How the region is located.
    pub marker: Marker,
    /// Desired region text.
    pub text: String,
}

impl PatchResource {
    /// Create a new patch resource.
    #[must_use]
    pub const fn new(path: PathBuf, marker: Marker, text: String) -> Self {
        Self { path, marker, text }
    }
}

impl Resource for PatchResource {
    fn current_state(&self, view: &dyn FileSystemView) -> Result<ResourceState, ReconcileError> {
        let Some(content) = view.read(&self.path)? else {
            return Ok(ResourceState::Invalid {
                reason: format!("host file {} does not exist", self.path.display()),
            });
        };
        Ok(match self.marker.region(&content) {
            None => ResourceState::Missing,
            Some(region) if same_text(region, &self.text) => ResourceState::Correct,
            Some(region) => ResourceState::Incorrect {
                current: region.to_string(),
            },
        })
    }
}
