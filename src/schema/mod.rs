//! Declarative, versioned description of desired state.
//!
//! A [`Schema`] is an ordered list of [`ManagedEntry`] values.  Order is part
//! of the contract: entries touching the same file are planned and applied
//! in declaration order.
pub mod builtin;
pub mod validation;

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::context::ProjectContext;
use crate::resources::patch::Marker;

/// Owner tag of the entries this tool ships.
pub const DEFAULT_OWNER: &str = "warden";

/// Applicability test over the project context.
pub type Predicate = fn(&ProjectContext) -> bool;

/// Content that is either fixed or generated from the project context.
#[derive(Debug, Clone)]
pub enum Source<T> {
    /// Fixed content.
    Literal(T),
    /// Content rendered from the context.
    Render(fn(&ProjectContext) -> T),
}

impl<T: Clone> Source<T> {
    /// Evaluate against `ctx`.
    #[must_use]
    pub fn resolve(&self, ctx: &ProjectContext) -> T {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Render(render) => render(ctx),
        }
    }
}

impl From<&str> for Source<String> {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Source<String> {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<Value> for Source<Value> {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// Which removal modes process an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
    /// Removed by every uninstall.
    #[default]
    Standard,
    /// Removed only by a full uninstall.
    FullOnly,
}

/// What an entry owns and how its desired state is produced.
#[derive(Debug, Clone)]
pub enum EntryKind {
    /// The entire file.
    WriteFile {
        /// Desired file content.
        content: Source<String>,
    },
    /// A marked region of a file the user also edits.
    TextPatch {
        /// How the region is located.
        marker: Marker,
        /// Desired region text, including its marker line(s).
        text: Source<String>,
    },
    /// Values of a JSON fragment inside a shared document.
    JsonMerge {
        /// The fragment; must be an object.
        fragment: Source<Value>,
    },
    /// The executable bit of a file.
    Chmod {
        /// Desired state of the bit.
        executable: bool,
    },
}

impl EntryKind {
    /// Short kind name used in logs and validation messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WriteFile { .. } => "write-file",
            Self::TextPatch { .. } => "text-patch",
            Self::JsonMerge { .. } => "json-merge",
            Self::Chmod { .. } => "chmod",
        }
    }
}

/// One declared unit of desired state.
#[derive(Debug, Clone)]
pub struct ManagedEntry {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Owner tag scoping which uninstall passes may touch this entry.
    pub owner: String,
    /// What the entry owns.
    pub kind: EntryKind,
    /// Applicability test; `None` means always applicable.
    pub predicate: Option<Predicate>,
    /// Removal tier.
    pub tier: Tier,
    /// Never removed by uninstall when set.
    pub persists_on_uninstall: bool,
    /// External packages this entry needs.
    pub packages: Vec<String>,
}

impl ManagedEntry {
    fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            owner: DEFAULT_OWNER.to_string(),
            kind,
            predicate: None,
            tier: Tier::Standard,
            persists_on_uninstall: false,
            packages: Vec::new(),
        }
    }

    /// An entry owning the whole file at `path`.
    #[must_use]
    pub fn write_file(path: impl Into<PathBuf>, content: impl Into<Source<String>>) -> Self {
        Self::new(
            path,
            EntryKind::WriteFile {
                content: content.into(),
            },
        )
    }

    /// An entry owning the region located by `marker` in the file at `path`.
    #[must_use]
    pub fn text_patch(
        path: impl Into<PathBuf>,
        marker: Marker,
        text: impl Into<Source<String>>,
    ) -> Self {
        Self::new(
            path,
            EntryKind::TextPatch {
                marker,
                text: text.into(),
            },
        )
    }

    /// An entry owning the values of `fragment` in the JSON document at `path`.
    #[must_use]
    pub fn json_merge(path: impl Into<PathBuf>, fragment: impl Into<Source<Value>>) -> Self {
        Self::new(
            path,
            EntryKind::JsonMerge {
                fragment: fragment.into(),
            },
        )
    }

    /// An entry owning the executable bit of `path`.
    #[must_use]
    pub fn chmod(path: impl Into<PathBuf>, executable: bool) -> Self {
        Self::new(path, EntryKind::Chmod { executable })
    }

    /// Set the owner tag.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Restrict the entry to projects matching `predicate`.
    #[must_use]
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Only remove this entry on a full uninstall.
    #[must_use]
    pub fn full_only(mut self) -> Self {
        self.tier = Tier::FullOnly;
        self
    }

    /// Never remove this entry on uninstall.
    #[must_use]
    pub fn persists_on_uninstall(mut self) -> Self {
        self.persists_on_uninstall = true;
        self
    }

    /// Declare an external package this entry needs.
    #[must_use]
    pub fn requires_package(mut self, name: impl Into<String>) -> Self {
        self.packages.push(name.into());
        self
    }

    /// Whether the entry applies to `ctx`.
    #[must_use]
    pub fn applies(&self, ctx: &ProjectContext) -> bool {
        self.predicate.is_none_or(|p| p(ctx))
    }
}

impl fmt::Display for ManagedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.path.display())
    }
}

/// An ordered, versioned collection of managed entries.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Version recorded in the project's version marker once converged.
    pub version: semver::Version,
    /// Entries in declaration order.
    pub entries: Vec<ManagedEntry>,
}

impl Schema {
    /// An empty schema at `version`.
    #[must_use]
    pub const fn new(version: semver::Version) -> Self {
        Self {
            version,
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    #[must_use]
    pub fn with(mut self, entry: ManagedEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// The schema shipped with this binary.
    #[must_use]
    pub fn builtin() -> Self {
        builtin::schema()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uses_python(ctx: &ProjectContext) -> bool {
        ctx.languages.python
    }

    fn render_name(ctx: &ProjectContext) -> String {
        format!("root: {}", ctx.root.display())
    }

    #[test]
    fn builder_sets_fields() {
        let entry = ManagedEntry::write_file("lint/ruff.toml", "x = 1")
            .owned_by("python-pack")
            .when(uses_python)
            .full_only()
            .persists_on_uninstall()
            .requires_package("ruff");

        assert_eq!(entry.owner, "python-pack");
        assert_eq!(entry.tier, Tier::FullOnly);
        assert!(entry.persists_on_uninstall);
        assert_eq!(entry.packages, ["ruff"]);
        assert_eq!(entry.to_string(), "write-file lint/ruff.toml");
    }

    #[test]
    fn predicate_gates_applicability() {
        let entry = ManagedEntry::write_file("a", "b").when(uses_python);
        let mut ctx = ProjectContext::new("/p");
        assert!(!entry.applies(&ctx));
        ctx.languages.python = true;
        assert!(entry.applies(&ctx));
        assert!(ManagedEntry::chmod("a", true).applies(&ProjectContext::new("/p")));
    }

    #[test]
    fn sources_resolve_against_context() {
        let ctx = ProjectContext::new("/p");
        let literal: Source<String> = "fixed".into();
        assert_eq!(literal.resolve(&ctx), "fixed");
        assert_eq!(Source::Render(render_name).resolve(&ctx), "root: /p");
        let fragment: Source<Value> = json!({"a": 1}).into();
        assert_eq!(fragment.resolve(&ctx), json!({"a": 1}));
    }

    #[test]
    fn builtin_defaults_to_tool_owner() {
        let schema = Schema::builtin();
        assert!(!schema.entries.is_empty());
        assert!(schema.entries.iter().all(|e| e.owner == DEFAULT_OWNER));
    }
}
