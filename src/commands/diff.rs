//! Diff command: preview a lifecycle operation without writing.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::{DiffOpts, GlobalOpts};
use crate::logging::{Log, Logger};
use crate::operations::DiskView;
use crate::reconcile::{Mode, diff};
use crate::state;

/// Render the preview for `mode` (or the mode implied by the version
/// marker when `None`).
///
/// # Errors
///
/// Returns an error if planning or simulating the plan fails.
pub fn render(
    setup: &CommandSetup,
    mode: Option<Mode>,
    patch: bool,
    log: &dyn Log,
) -> Result<String> {
    let mode = match mode {
        Some(mode) => mode,
        None if state::read_installed(&setup.root)?.is_some() => Mode::Upgrade,
        None => Mode::Install,
    };
    log.stage(&format!("Previewing {mode}"));
    let plan = setup.plan(mode, None)?;
    for note in &plan.notes {
        log.warn(note);
    }
    let mut out = diff::render(&plan.actions, &DiskView::new(&setup.root), patch)?;
    if !plan.packages_to_install.is_empty() {
        out.push_str(&format!(
            "packages to install: {}\n",
            plan.packages_to_install.join(", ")
        ));
    }
    if !plan.packages_to_remove.is_empty() {
        out.push_str(&format!(
            "packages to remove: {}\n",
            plan.packages_to_remove.join(", ")
        ));
    }
    Ok(out)
}

/// Run the diff command.
///
/// # Errors
///
/// Returns an error if setup, planning, or simulation fails.
pub fn run(global: &GlobalOpts, opts: &DiffOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let out = render(&setup, opts.mode.map(Mode::from), opts.patch, log)?;
    print!("{out}");
    Ok(())
}
