//! Version marker persisted inside the project.
//!
//! `.warden/version` holds the schema version that last converged the
//! project.  It is the only state the engine persists; ownership of
//! individual artifacts is re-derived from their content on every run.
use std::io;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::context::STATE_DIR;
use crate::error::ReconcileError;
use crate::reconcile::Mode;
use crate::resources::fs;

/// Marker path relative to the project root.
#[must_use]
pub fn marker_path() -> PathBuf {
    Path::new(STATE_DIR).join("version")
}

/// Read the installed version, `None` when nothing is installed.
///
/// # Errors
///
/// Returns an error if the marker exists but cannot be read or does not
/// hold a semantic version.
pub fn read_installed(root: &Path) -> Result<Option<Version>, ReconcileError> {
    let relative = marker_path();
    let text = match std::fs::read_to_string(root.join(&relative)) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ReconcileError::io("read", relative, e)),
    };
    Version::parse(text.trim())
        .map(Some)
        .map_err(|e| ReconcileError::InvalidDocument {
            path: relative,
            message: e.to_string(),
        })
}

/// Record `version` as installed.
///
/// # Errors
///
/// Returns an error if the marker cannot be written.
pub fn write_installed(root: &Path, version: &Version) -> Result<(), ReconcileError> {
    let relative = marker_path();
    let target = root.join(&relative);
    fs::ensure_parent_dir(&target)?;
    std::fs::write(&target, format!("{version}\n"))
        .map_err(|e| ReconcileError::io("write", relative, e))
}

/// Delete the marker and the state directory if that leaves it empty.
///
/// # Errors
///
/// Returns an error if the marker or the directory cannot be removed.
pub fn remove_installed(root: &Path) -> Result<(), ReconcileError> {
    let target = root.join(marker_path());
    fs::remove_existing(&target)?;
    fs::prune_empty_dirs(root, &root.join(STATE_DIR))?;
    Ok(())
}

/// Refuse lifecycle operations that do not match what is installed.
///
/// Upgrade and uninstall require a marker; no mode may run against a project
/// converged by a newer schema.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingPrerequisite`] or
/// [`ReconcileError::VersionConflict`].
pub fn guard(
    root: &Path,
    mode: Mode,
    installed: Option<&Version>,
    schema: &Version,
) -> Result<(), ReconcileError> {
    match installed {
        None if mode != Mode::Install => Err(ReconcileError::MissingPrerequisite {
            root: root.to_path_buf(),
        }),
        Some(found) if found > schema => Err(ReconcileError::VersionConflict {
            installed: found.clone(),
            schema: schema.clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn missing_marker_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_installed(dir.path()).unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        write_installed(dir.path(), &v("1.4.0")).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".warden/version")).unwrap(),
            "1.4.0\n"
        );
        assert_eq!(read_installed(dir.path()).unwrap(), Some(v("1.4.0")));
    }

    #[test]
    fn garbage_marker_is_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".warden")).unwrap();
        std::fs::write(dir.path().join(".warden/version"), "banana").unwrap();
        assert!(matches!(
            read_installed(dir.path()),
            Err(ReconcileError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn remove_prunes_empty_state_dir_only() {
        let dir = tempfile::tempdir().unwrap();
        write_installed(dir.path(), &v("1.0.0")).unwrap();
        remove_installed(dir.path()).unwrap();
        assert!(!dir.path().join(".warden").exists());

        write_installed(dir.path(), &v("1.0.0")).unwrap();
        std::fs::create_dir_all(dir.path().join(".warden/packs/python")).unwrap();
        remove_installed(dir.path()).unwrap();
        assert!(dir.path().join(".warden/packs/python").is_dir());
        assert!(!dir.path().join(".warden/version").exists());
    }

    #[test]
    fn guard_rules() {
        let root = Path::new("/work");
        let schema = v("1.4.0");
        assert!(guard(root, Mode::Install, None, &schema).is_ok());
        assert!(matches!(
            guard(root, Mode::Upgrade, None, &schema),
            Err(ReconcileError::MissingPrerequisite { .. })
        ));
        assert!(matches!(
            guard(root, Mode::UninstallFull, None, &schema),
            Err(ReconcileError::MissingPrerequisite { .. })
        ));
        assert!(guard(root, Mode::Upgrade, Some(&v("1.2.0")), &schema).is_ok());
        assert!(guard(root, Mode::Install, Some(&v("1.4.0")), &schema).is_ok());
        assert!(matches!(
            guard(root, Mode::Install, Some(&v("2.0.0")), &schema),
            Err(ReconcileError::VersionConflict { .. })
        ));
    }
}
