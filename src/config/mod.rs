//! Project configuration (`warden.toml`).
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::context::PackageManager;
use crate::error::ConfigError;

/// File name of the optional per-project configuration.
pub const CONFIG_FILE: &str = "warden.toml";

/// User settings read from `warden.toml` at the project root.
///
/// Every field is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Entry paths the tool must never touch.
    pub exclude: Vec<PathBuf>,
    /// Package manager override, bypassing lockfile detection.
    pub package_manager: Option<String>,
    /// Extra packs to treat as installed.
    pub packs: Vec<String>,
}

impl ProjectConfig {
    /// Load the configuration for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it
    /// names an unknown package manager.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml_loader::load_config(&root.join(CONFIG_FILE))?;
        config.package_manager_override()?;
        Ok(config)
    }

    /// The configured package manager, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPackageManager`] for unrecognised names.
    pub fn package_manager_override(&self) -> Result<Option<PackageManager>, ConfigError> {
        self.package_manager
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}
