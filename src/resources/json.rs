//! JSON fragments merged into documents shared with the user.
//!
//! Merging is recursive for objects, an ordered union by equality for
//! arrays, and replacement for scalars.  Unmerging is value-aware: only
//! values still equal to the fragment's are removed, and containers left
//! empty by the removal are pruned.
//!
//! Documents are written back in the layout they were found in (see
//! [`JsonStyle`]), so a merge followed by an unmerge reproduces the user's
//! bytes for the layouts `serde_json` can emit.
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize as _;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Value};

use super::{Resource, ResourceState};
use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// Parse the document at `path`; a missing or blank file is an empty object.
///
/// # Errors
///
/// Returns [`ReconcileError::InvalidDocument`] if the content is not a JSON
/// object.
pub fn parse_document(path: &Path, content: Option<&str>) -> Result<Value, ReconcileError> {
    let Some(text) = content.filter(|t| !t.trim().is_empty()) else {
        return Ok(Value::Object(Map::new()));
    };
    let value: Value =
        serde_json::from_str(text).map_err(|e| ReconcileError::InvalidDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ReconcileError::InvalidDocument {
            path: path.to_path_buf(),
            message: "top-level value is not an object".to_string(),
        })
    }
}

/// Layout of a JSON document, detected from its text and reused on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStyle {
    layout: Layout,
    trailing_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// One member per line, nested with this indent.
    Pretty(String),
    /// Everything on one line; `spaced` puts a space after `:` and `,`.
    Inline { spaced: bool },
}

impl Default for JsonStyle {
    /// Two-space pretty printing with a trailing newline.
    fn default() -> Self {
        Self {
            layout: Layout::Pretty("  ".to_string()),
            trailing_newline: true,
        }
    }
}

impl JsonStyle {
    /// Detect the layout of `text`.  Absent, blank, and memberless documents
    /// get the default layout.
    ///
    /// ```
    /// use serde_json::json;
    /// use warden_cli::resources::json::JsonStyle;
    ///
    /// let style = JsonStyle::detect(Some("{\"a\": [1, 2]}\n"));
    /// assert_eq!(style.render(&json!({"a": [1, 2], "b": true})), "{\"a\": [1, 2], \"b\": true}\n");
    /// ```
    #[must_use]
    pub fn detect(text: Option<&str>) -> Self {
        let Some(text) = text.filter(|t| t.contains(':')) else {
            return Self::default();
        };
        let body = text.trim();
        let layout = if body.contains('\n') {
            let indent = body
                .lines()
                .skip(1)
                .filter(|line| !line.trim().is_empty())
                .filter_map(|line| line.get(..line.len() - line.trim_start().len()))
                .find(|indent| !indent.is_empty())
                .unwrap_or("  ");
            Layout::Pretty(indent.to_string())
        } else {
            Layout::Inline {
                spaced: body.contains(": "),
            }
        };
        Self {
            layout,
            trailing_newline: text.ends_with('\n'),
        }
    }

    /// Serialise `doc` in this layout.
    #[must_use]
    pub fn render(&self, doc: &Value) -> String {
        let mut out = match &self.layout {
            Layout::Pretty(indent) => serialize(doc, PrettyFormatter::with_indent(indent.as_bytes())),
            Layout::Inline { spaced } => serialize(doc, InlineFormatter { spaced: *spaced }),
        };
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}

fn serialize<F: Formatter>(doc: &Value, formatter: F) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if doc.serialize(&mut ser).is_err() {
        return "{}".to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| "{}".to_string())
}

/// Single-line output, optionally with `": "` and `", "` separators.
struct InlineFormatter {
    spaced: bool,
}

impl InlineFormatter {
    fn separator(&self) -> &'static [u8] {
        if self.spaced { b", " } else { b"," }
    }
}

impl Formatter for InlineFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(self.separator())
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(self.separator())
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(if self.spaced { b": " } else { b":" })
    }
}

/// Whether `doc` is an object with no keys.
#[must_use]
pub fn is_empty_document(doc: &Value) -> bool {
    doc.as_object().is_some_and(Map::is_empty)
}

/// Whether every value of `fragment` is already present in `doc`.
///
/// ```
/// use serde_json::json;
/// use warden_cli::resources::json::contains;
///
/// let doc = json!({"hooks": {"a": 1, "b": 2}, "list": [1, 2, 3]});
/// assert!(contains(&doc, &json!({"hooks": {"a": 1}, "list": [3]})));
/// assert!(!contains(&doc, &json!({"hooks": {"a": 0}})));
/// ```
#[must_use]
pub fn contains(doc: &Value, fragment: &Value) -> bool {
    match (doc, fragment) {
        (Value::Object(have), Value::Object(want)) => want
            .iter()
            .all(|(key, value)| have.get(key).is_some_and(|h| contains(h, value))),
        (Value::Array(have), Value::Array(want)) => want.iter().all(|w| have.contains(w)),
        _ => doc == fragment,
    }
}

/// Deep-merge `fragment` into `doc`.
pub fn merge(doc: &mut Value, fragment: &Value) {
    match (doc, fragment) {
        (Value::Object(have), Value::Object(want)) => {
            for (key, value) in want {
                match have.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        have.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(have), Value::Array(want)) => {
            for item in want {
                if !have.contains(item) {
                    have.push(item.clone());
                }
            }
        }
        (doc, _) => *doc = fragment.clone(),
    }
}

/// Remove from `doc` every value of `fragment` it still holds unchanged.
///
/// Returns whether anything was removed.  Objects and arrays emptied by the
/// removal are pruned from their parent; values the user changed survive.
pub fn unmerge(doc: &mut Value, fragment: &Value) -> bool {
    let (Value::Object(have), Value::Object(want)) = (doc, fragment) else {
        return false;
    };
    let mut changed = false;
    for (key, value) in want {
        let Some(existing) = have.get_mut(key) else {
            continue;
        };
        let remove = if existing.is_object() && value.is_object() {
            let removed = unmerge(existing, value);
            changed |= removed;
            removed && is_empty_document(existing)
        } else if let (Value::Array(items), Value::Array(owned)) = (&mut *existing, value) {
            let before = items.len();
            items.retain(|item| !owned.contains(item));
            let removed = items.len() != before;
            changed |= removed;
            removed && items.is_empty()
        } else {
            *existing == *value
        };
        if remove {
            have.shift_remove(key);
            changed = true;
        }
    }
    changed
}

/// A fragment of JSON values owned inside a shared document.
#[derive(Debug, Clone)]
pub struct JsonFragmentResource {
    /// Document path relative to the project root.
    pub path: PathBuf,
    /// Values this entry owns.
    pub fragment: Value,
}

impl JsonFragmentResource {
    /// Create a new JSON fragment resource.
    #[must_use]
    pub const fn new(path: PathBuf, fragment: Value) -> Self {
        Self { path, fragment }
    }

    /// Whether unmerging this fragment would change the current document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    pub fn is_present(&self, view: &dyn FileSystemView) -> Result<bool, ReconcileError> {
        let content = view.read(&self.path)?;
        if content.is_none() {
            return Ok(false);
        }
        let mut doc = parse_document(&self.path, content.as_deref())?;
        Ok(unmerge(&mut doc, &self.fragment))
    }
}

impl Resource for JsonFragmentResource {
    fn current_state(&self, view: &dyn FileSystemView) -> Result<ResourceState, ReconcileError> {
        let Some(content) = view.read(&self.path)? else {
            return Ok(ResourceState::Missing);
        };
        let doc = parse_document(&self.path, Some(&content))?;
        if contains(&doc, &self.fragment) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: "fragment values differ".to_string(),
            })
        }
    }
}
