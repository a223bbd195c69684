//! Diff presenter: renders an action list without touching the filesystem.
use std::fmt::Write as _;

use similar::TextDiff;

use super::Action;
use super::staging::{StagedChange, Staging};
use crate::error::ReconcileError;
use crate::operations::FileSystemView;

/// Render `actions` as a grouped summary, optionally followed by a unified
/// line diff of every added or modified file.
///
/// The actions are simulated over `view`; nothing else is read.
///
/// # Errors
///
/// Returns an error if the simulation fails (e.g., unreadable files or
/// unparseable JSON documents).
pub fn render(
    actions: &[Action],
    view: &dyn FileSystemView,
    verbose: bool,
) -> Result<String, ReconcileError> {
    let mut staging = Staging::new(view);
    staging.apply_all(actions)?;
    let changes = staging.changes();

    if changes.is_empty() {
        return Ok("no changes\n".to_string());
    }

    let added: Vec<&StagedChange> = changes.iter().filter(|c| c.is_created()).collect();
    let removed: Vec<&StagedChange> = changes.iter().filter(|c| c.is_removed()).collect();
    let unchanged: Vec<&StagedChange> = changes.iter().filter(|c| c.is_unchanged()).collect();
    let modified: Vec<&StagedChange> = changes
        .iter()
        .filter(|c| !c.is_created() && !c.is_removed() && !c.is_unchanged())
        .collect();

    let mut out = String::new();
    for (heading, sign, group) in [
        ("added", '+', &added),
        ("modified", '~', &modified),
        ("removed", '-', &removed),
        ("unchanged", '=', &unchanged),
    ] {
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{heading}:");
        for change in group {
            let _ = write!(out, "  {sign} {}", change.path.display());
            if change.mode_changed() && !change.is_created() {
                let bit = if change.executable_after == Some(true) {
                    "+x"
                } else {
                    "-x"
                };
                let _ = write!(out, " (mode {bit})");
            }
            out.push('\n');
        }
    }

    if verbose {
        for change in added.iter().chain(&modified) {
            if !change.content_changed() {
                continue;
            }
            let before = change.before.as_deref().unwrap_or_default();
            let after = change.after.as_deref().unwrap_or_default();
            let from = if change.before.is_some() {
                format!("a/{}", change.path.display())
            } else {
                "/dev/null".to_string()
            };
            let to = format!("b/{}", change.path.display());
            out.push('\n');
            let diff = TextDiff::from_lines(before, after);
            let _ = write!(out, "{}", diff.unified_diff().context_radius(3).header(&from, &to));
        }
    }

    Ok(out)
}
