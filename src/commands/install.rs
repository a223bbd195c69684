//! Install command implementation.
use anyhow::Result;

use super::{CommandSetup, RunOptions, run_lifecycle};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::reconcile::Mode;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if setup, the version guard, planning, or applying fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    run_mode(Mode::Install, global, opts, log)
}

/// Shared body of `install` and `upgrade`.
pub(super) fn run_mode(
    mode: Mode,
    global: &GlobalOpts,
    opts: &InstallOpts,
    log: &Logger,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let run_opts = RunOptions {
        dry_run: global.dry_run,
        owner: None,
        manage_packages: opts.install_deps,
    };
    let result = run_lifecycle(&setup, mode, &run_opts, &SystemExecutor, log)?;
    log.print_summary(&result, global.dry_run);
    if !opts.install_deps && !result.packages_to_install.is_empty() {
        log.info("rerun with --install-deps to install them");
    }
    Ok(())
}
