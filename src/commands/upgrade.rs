//! Upgrade command implementation.
use anyhow::Result;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::logging::Logger;
use crate::reconcile::Mode;

/// Run the upgrade command.
///
/// # Errors
///
/// Returns an error if nothing is installed, the installed version is newer
/// than the schema, or planning or applying fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    super::install::run_mode(Mode::Upgrade, global, opts, log)
}
