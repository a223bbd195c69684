use std::io;
use std::path::{Path, PathBuf};

use super::{Resource, ResourceState};
use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// Whether permission bits can be managed on this platform.
#[must_use]
pub const fn supported() -> bool {
    cfg!(unix)
}

/// Whether any execute bit is set in `meta`.
#[must_use]
pub fn is_executable(meta: &std::fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        let _ = meta;
        false
    }
}

/// Set or clear the executable bit of the file at `path`.
///
/// Setting grants execute to every class that can read the file; clearing
/// removes execute from all classes.  Other bits are left alone.
///
/// # Errors
///
/// Returns an error if the metadata cannot be read or the permissions
/// cannot be changed.
pub fn set_executable(path: &Path, executable: bool) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = std::fs::metadata(path)?.permissions().mode();
        let new_mode = if executable {
            mode | ((mode & 0o444) >> 2)
        } else {
            mode & !0o111
        };
        if new_mode != mode {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(new_mode))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = (path, executable);
        Ok(())
    }
}

/// The executable bit of a file whose content may be owned elsewhere.
#[derive(Debug, Clone)]
pub struct ChmodResource {
    /// Target path relative to the project root.
    pub path: PathBuf,
    /// Desired state of the executable bit.
    pub executable: bool,
}

impl ChmodResource {
    /// Create a new chmod resource.
    #[must_use]
    pub const fn new(path: PathBuf, executable: bool) -> Self {
        Self { path, executable }
    }
}

impl Resource for ChmodResource {
    fn current_state(&self, view: &dyn FileSystemView) -> Result<ResourceState, ReconcileError> {
        Ok(match view.executable(&self.path)? {
            None => ResourceState::Invalid {
                reason: format!("target does not exist: {}", self.path.display()),
            },
            Some(current) if current == self.executable => ResourceState::Correct,
            Some(current) => ResourceState::Incorrect {
                current: if current { "executable" } else { "not executable" }.to_string(),
            },
        })
    }
}
