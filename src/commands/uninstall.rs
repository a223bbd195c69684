//! Uninstall command implementation.
use anyhow::Result;

use super::{CommandSetup, RunOptions, run_lifecycle};
use crate::cli::{GlobalOpts, UninstallOpts};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::reconcile::Mode;

/// Uninstall mode selected by `--full`.
#[must_use]
pub const fn mode(opts: &UninstallOpts) -> Mode {
    if opts.full {
        Mode::UninstallFull
    } else {
        Mode::Uninstall
    }
}

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if nothing is installed or removal fails.
pub fn run(global: &GlobalOpts, opts: &UninstallOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let run_opts = RunOptions {
        dry_run: global.dry_run,
        owner: opts.owner.clone(),
        manage_packages: opts.remove_deps,
    };
    let result = run_lifecycle(&setup, mode(opts), &run_opts, &SystemExecutor, log)?;
    log.print_summary(&result, global.dry_run);
    Ok(())
}
