//! Read-only facts about the host project.
//!
//! [`ProjectContext::detect`] inspects the project once per invocation;
//! schema predicates and content generators only ever see the resulting
//! value.
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::config::ProjectConfig;
use crate::error::ConfigError;

/// Directory holding this tool's own state inside the project.
pub const STATE_DIR: &str = ".warden";

/// Documents whose presence schema predicates may test.
pub const WELL_KNOWN_DOCUMENTS: &[&str] = &[
    "CLAUDE.md",
    "AGENTS.md",
    "README.md",
    ".gitignore",
    ".cursorrules",
];

/// JavaScript package manager used by the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// npm (`package-lock.json`).
    Npm,
    /// pnpm (`pnpm-lock.yaml`).
    Pnpm,
    /// Yarn (`yarn.lock`).
    Yarn,
    /// Bun (`bun.lockb`, `bun.lock`).
    Bun,
}

impl PackageManager {
    /// Lockfiles in detection priority order.
    const LOCKFILES: &[(&str, Self)] = &[
        ("pnpm-lock.yaml", Self::Pnpm),
        ("yarn.lock", Self::Yarn),
        ("bun.lockb", Self::Bun),
        ("bun.lock", Self::Bun),
        ("package-lock.json", Self::Npm),
    ];

    /// Executable name.
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for PackageManager {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" => Ok(Self::Yarn),
            "bun" => Ok(Self::Bun),
            _ => Err(ConfigError::UnknownPackageManager(s.to_string())),
        }
    }
}

/// Languages detected in the project.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Languages {
    /// `package.json` present.
    pub javascript: bool,
    /// `tsconfig.json` present or `typescript` declared.
    pub typescript: bool,
    /// Python project files present.
    pub python: bool,
    /// `go.mod` present.
    pub go: bool,
    /// `Cargo.toml` present.
    pub rust: bool,
}

/// Immutable snapshot of the host project.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Project root directory.
    pub root: PathBuf,
    /// Detected languages.
    pub languages: Languages,
    /// Detected or configured package manager.
    pub package_manager: Option<PackageManager>,
    /// Detected frameworks (lowercase names such as `react` or `django`).
    pub frameworks: BTreeSet<String>,
    /// Packs installed under `.warden/packs/` or listed in configuration.
    pub packs: BTreeSet<String>,
    /// Dependencies declared in `package.json` (all dependency tables).
    pub dependencies: BTreeSet<String>,
    /// Well-known documents present at the root.
    pub documents: BTreeSet<String>,
    /// Whether the root is inside a git repository.
    pub in_git: bool,
    /// Entry paths the user excluded.
    pub exclusions: Vec<PathBuf>,
}

impl ProjectContext {
    /// A context with nothing detected, for synthetic schemas and tests.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            languages: Languages::default(),
            package_manager: None,
            frameworks: BTreeSet::new(),
            packs: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            documents: BTreeSet::new(),
            in_git: false,
            exclusions: Vec::new(),
        }
    }

    /// Inspect the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured package manager is unknown.
    pub fn detect(root: &Path, config: &ProjectConfig) -> Result<Self, ConfigError> {
        let manifest = read_package_json(root);
        let dependencies = manifest
            .as_ref()
            .map(declared_dependencies)
            .unwrap_or_default();

        let languages = Languages {
            javascript: manifest.is_some(),
            typescript: root.join("tsconfig.json").is_file()
                || dependencies.contains("typescript"),
            python: ["pyproject.toml", "requirements.txt", "setup.py", "Pipfile"]
                .iter()
                .any(|f| root.join(f).is_file()),
            go: root.join("go.mod").is_file(),
            rust: root.join("Cargo.toml").is_file(),
        };

        let package_manager = match config.package_manager_override()? {
            Some(pm) => Some(pm),
            None => detect_package_manager(root, manifest.as_ref()),
        };

        let mut frameworks = js_frameworks(&dependencies);
        frameworks.extend(python_frameworks(root));

        let mut packs = installed_packs(root);
        packs.extend(config.packs.iter().cloned());

        let documents = WELL_KNOWN_DOCUMENTS
            .iter()
            .filter(|d| root.join(d).is_file())
            .map(|d| (*d).to_string())
            .collect();

        Ok(Self {
            root: root.to_path_buf(),
            languages,
            package_manager,
            frameworks,
            packs,
            dependencies,
            documents,
            in_git: git2::Repository::discover(root).is_ok(),
            exclusions: config.exclude.clone(),
        })
    }

    /// Set detected languages.
    #[must_use]
    pub const fn with_languages(mut self, languages: Languages) -> Self {
        self.languages = languages;
        self
    }

    /// Set the package manager.
    #[must_use]
    pub const fn with_package_manager(mut self, pm: PackageManager) -> Self {
        self.package_manager = Some(pm);
        self
    }

    /// Add a declared dependency.
    #[must_use]
    pub fn with_dependency(mut self, name: &str) -> Self {
        self.dependencies.insert(name.to_string());
        self
    }

    /// Add an installed pack.
    #[must_use]
    pub fn with_pack(mut self, name: &str) -> Self {
        self.packs.insert(name.to_string());
        self
    }

    /// Mark a well-known document as present.
    #[must_use]
    pub fn with_document(mut self, name: &str) -> Self {
        self.documents.insert(name.to_string());
        self
    }

    /// Exclude an entry path.
    #[must_use]
    pub fn with_exclusion(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclusions.push(path.into());
        self
    }

    /// Whether the project declares `name` as a dependency.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.dependencies.contains(name)
    }

    /// Whether `pack` is installed.
    #[must_use]
    pub fn has_pack(&self, pack: &str) -> bool {
        self.packs.contains(pack)
    }

    /// Whether the well-known document `name` is present.
    #[must_use]
    pub fn has_document(&self, name: &str) -> bool {
        self.documents.contains(name)
    }

    /// Whether `framework` was detected.
    #[must_use]
    pub fn has_framework(&self, framework: &str) -> bool {
        self.frameworks.contains(framework)
    }

    /// Whether the user excluded `path`.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclusions.iter().any(|e| e == path)
    }
}

fn read_package_json(root: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(root.join("package.json")).ok()?;
    Some(serde_json::from_str(&content).unwrap_or(Value::Null))
}

fn declared_dependencies(manifest: &Value) -> BTreeSet<String> {
    [
        "dependencies",
        "devDependencies",
        "peerDependencies",
        "optionalDependencies",
    ]
    .iter()
    .filter_map(|table| manifest.get(table).and_then(Value::as_object))
    .flat_map(|deps| deps.keys().cloned())
    .collect()
}

fn detect_package_manager(root: &Path, manifest: Option<&Value>) -> Option<PackageManager> {
    let declared = manifest
        .and_then(|m| m.get("packageManager"))
        .and_then(Value::as_str)
        .and_then(|spec| spec.split('@').next())
        .and_then(|name| name.parse::<PackageManager>().ok());
    declared.or_else(|| {
        PackageManager::LOCKFILES
            .iter()
            .find(|(file, _)| root.join(file).is_file())
            .map(|(_, pm)| *pm)
            .or_else(|| manifest.map(|_| PackageManager::Npm))
    })
}

fn js_frameworks(dependencies: &BTreeSet<String>) -> BTreeSet<String> {
    const KNOWN: &[(&str, &str)] = &[
        ("react", "react"),
        ("next", "next"),
        ("vue", "vue"),
        ("svelte", "svelte"),
        ("@angular/core", "angular"),
        ("express", "express"),
        ("vitest", "vitest"),
        ("jest", "jest"),
    ];
    KNOWN
        .iter()
        .filter(|(dep, _)| dependencies.contains(*dep))
        .map(|(_, name)| (*name).to_string())
        .collect()
}

fn python_frameworks(root: &Path) -> BTreeSet<String> {
    const KNOWN: &[&str] = &["django", "flask", "fastapi", "pytest"];
    let text: String = ["pyproject.toml", "requirements.txt", "Pipfile"]
        .iter()
        .filter_map(|f| std::fs::read_to_string(root.join(f)).ok())
        .collect::<Vec<_>>()
        .join("\n")
        .to_ascii_lowercase();
    KNOWN
        .iter()
        .filter(|name| text.contains(*name))
        .map(|name| (*name).to_string())
        .collect()
}

fn installed_packs(root: &Path) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(root.join(STATE_DIR).join("packs")) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detect(dir: &Path) -> ProjectContext {
        ProjectContext::detect(dir, &ProjectConfig::default()).unwrap()
    }

    #[test]
    fn empty_directory_detects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = detect(dir.path());
        assert_eq!(ctx.languages, Languages::default());
        assert!(ctx.package_manager.is_none());
        assert!(ctx.dependencies.is_empty());
        assert!(ctx.documents.is_empty());
    }

    #[test]
    fn detects_javascript_dependencies_and_frameworks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"react":"^18"},"devDependencies":{"typescript":"^5"}}"#,
        )
        .unwrap();
        let ctx = detect(dir.path());
        assert!(ctx.languages.javascript);
        assert!(ctx.languages.typescript);
        assert!(ctx.declares("react"));
        assert!(ctx.has_framework("react"));
        assert_eq!(ctx.package_manager, Some(PackageManager::Npm));
    }

    #[test]
    fn lockfile_selects_package_manager() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(detect(dir.path()).package_manager, Some(PackageManager::Pnpm));
    }

    #[test]
    fn package_manager_field_wins_over_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"packageManager":"yarn@4.1.0"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(detect(dir.path()).package_manager, Some(PackageManager::Yarn));
    }

    #[test]
    fn config_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        let config = ProjectConfig {
            package_manager: Some("bun".to_string()),
            ..ProjectConfig::default()
        };
        let ctx = ProjectContext::detect(dir.path(), &config).unwrap();
        assert_eq!(ctx.package_manager, Some(PackageManager::Bun));
    }

    #[test]
    fn detects_python_frameworks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "Django==5.0\npytest\n").unwrap();
        let ctx = detect(dir.path());
        assert!(ctx.languages.python);
        assert!(ctx.has_framework("django"));
        assert!(ctx.has_framework("pytest"));
    }

    #[test]
    fn detects_packs_documents_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".warden/packs/python")).unwrap();
        std::fs::write(dir.path().join("CLAUDE.md"), "# Notes").unwrap();
        let config = ProjectConfig {
            exclude: vec![PathBuf::from("AGENTS.md")],
            packs: vec!["go".to_string()],
            ..ProjectConfig::default()
        };
        let ctx = ProjectContext::detect(dir.path(), &config).unwrap();
        assert!(ctx.has_pack("python"));
        assert!(ctx.has_pack("go"));
        assert!(ctx.has_document("CLAUDE.md"));
        assert!(!ctx.has_document("AGENTS.md"));
        assert!(ctx.is_excluded(Path::new("AGENTS.md")));
    }

    #[test]
    fn detects_git_repository() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(detect(&dir.path().join("sub")).in_git);
    }

    #[test]
    fn package_manager_parsing() {
        assert_eq!("PNPM".parse::<PackageManager>().unwrap(), PackageManager::Pnpm);
        assert!("pip".parse::<PackageManager>().is_err());
        assert_eq!(PackageManager::Bun.to_string(), "bun");
    }
}
