//! Action planner: the reconciliation core.
//!
//! Walks the schema in declaration order, classifies each entry's artifact
//! through its [`Resource`](crate::resources::Resource), and emits the
//! minimal [`Action`] list that converges the project for the requested
//! [`Mode`].  Every emitted action is staged so later entries touching the
//! same file see its effect.
//!
//! A whole-file entry may be followed by patches or merges on the same path.
//! Its artifact is then judged against the composed content (the file with
//! those later entries applied), so a converged file needs no rewrite and is
//! still recognised on removal.
use std::path::Path;

use super::staging::{self, Staging};
use super::{Action, Mode, Plan, push_unique};
use crate::context::ProjectContext;
use crate::error::ReconcileError;
use crate::operations::FileSystemView;
use crate::resources::chmod::{self, ChmodResource};
use crate::resources::file::{self, FileResource};
use crate::resources::json::JsonFragmentResource;
use crate::resources::patch::PatchResource;
use crate::resources::{Resource as _, ResourceState, same_text};
use crate::schema::{EntryKind, ManagedEntry, Schema};

/// Compute the actions that converge the project for `mode`.
///
/// Read-only: the project is only inspected through `view`.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingPatchTarget`] or
/// [`ReconcileError::MissingChmodTarget`] for entries whose target does not
/// exist during install/upgrade, [`ReconcileError::InvalidDocument`] for
/// unparseable JSON documents, and I/O errors from the view.
pub fn plan(
    schema: &Schema,
    mode: Mode,
    ctx: &ProjectContext,
    view: &dyn FileSystemView,
) -> Result<Plan, ReconcileError> {
    plan_for_owner(schema, mode, ctx, view, None)
}

/// Like [`plan`], restricted to entries tagged with `owner` when given.
///
/// # Errors
///
/// See [`plan`].
pub fn plan_for_owner(
    schema: &Schema,
    mode: Mode,
    ctx: &ProjectContext,
    view: &dyn FileSystemView,
    owner: Option<&str>,
) -> Result<Plan, ReconcileError> {
    let mut staging = Staging::new(view);
    let mut plan = Plan::new(mode);

    for (index, entry) in schema.entries.iter().enumerate() {
        let later = schema.entries.get(index + 1..).unwrap_or_default();
        if owner.is_some_and(|o| o != entry.owner) {
            continue;
        }
        if ctx.is_excluded(&entry.path) {
            if !plan.excluded.contains(&entry.path) {
                plan.excluded.push(entry.path.clone());
            }
            continue;
        }

        let action = if mode.is_removal() {
            if entry.persists_on_uninstall || !mode.removes(entry.tier) {
                continue;
            }
            let action = plan_removal(entry, schema, later, ctx, &staging, &mut plan.notes)?;
            if action.is_some() {
                for package in &entry.packages {
                    if ctx.declares(package) {
                        push_unique(&mut plan.packages_to_remove, package);
                    }
                }
            }
            action
        } else {
            if !entry.applies(ctx) {
                continue;
            }
            for package in &entry.packages {
                if !ctx.declares(package) {
                    push_unique(&mut plan.packages_to_install, package);
                }
            }
            plan_convergence(entry, later, ctx, &staging, &mut plan.notes)?
        };

        if let Some(action) = action {
            staging.apply(&action)?;
            plan.actions.push(action);
        }
    }

    Ok(plan)
}

/// The action an entry contributes when it is laid over a file it shares.
fn overlay_action(entry: &ManagedEntry, ctx: &ProjectContext) -> Option<Action> {
    let path = entry.path.clone();
    match &entry.kind {
        EntryKind::WriteFile { content } => Some(Action::UpdateFile {
            path,
            content: content.resolve(ctx),
        }),
        EntryKind::TextPatch { marker, text } => Some(Action::InsertPatch {
            path,
            marker: marker.clone(),
            text: text.resolve(ctx),
        }),
        EntryKind::JsonMerge { fragment } => Some(Action::JsonMerge {
            path,
            fragment: fragment.resolve(ctx),
        }),
        EntryKind::Chmod { .. } => None,
    }
}

/// Whether `current` equals `content` once every applicable later entry on
/// `path` has been layered over it.
fn matches_composed(
    path: &Path,
    content: &str,
    later: &[ManagedEntry],
    ctx: &ProjectContext,
    current: &str,
) -> Result<bool, ReconcileError> {
    let overlays: Vec<Action> = later
        .iter()
        .filter(|e| e.path == path && e.applies(ctx))
        .filter_map(|e| overlay_action(e, ctx))
        .collect();
    if overlays.is_empty() {
        return Ok(false);
    }
    let composed = staging::compose(path, content, &overlays)?;
    Ok(composed.is_some_and(|c| same_text(current, &c)))
}

/// Install/upgrade: bring one entry to its desired state.
fn plan_convergence(
    entry: &ManagedEntry,
    later: &[ManagedEntry],
    ctx: &ProjectContext,
    view: &dyn FileSystemView,
    notes: &mut Vec<String>,
) -> Result<Option<Action>, ReconcileError> {
    let path = entry.path.clone();
    Ok(match &entry.kind {
        EntryKind::WriteFile { content } => {
            let resource = FileResource::new(path, content.resolve(ctx));
            match resource.current_state(view)? {
                ResourceState::Missing => Some(Action::CreateFile {
                    path: resource.path,
                    content: resource.content,
                }),
                ResourceState::Incorrect { .. } => {
                    let current = view.read(&resource.path)?.unwrap_or_default();
                    if matches_composed(&resource.path, &resource.content, later, ctx, &current)? {
                        None
                    } else {
                        Some(Action::UpdateFile {
                            path: resource.path,
                            content: resource.content,
                        })
                    }
                }
                ResourceState::Correct | ResourceState::Invalid { .. } => None,
            }
        }
        EntryKind::TextPatch { marker, text } => {
            let resource = PatchResource::new(path, marker.clone(), text.resolve(ctx));
            match resource.current_state(view)? {
                ResourceState::Invalid { .. } => {
                    return Err(ReconcileError::MissingPatchTarget {
                        path: resource.path,
                        marker: resource.marker.start,
                    });
                }
                ResourceState::Missing => Some(Action::InsertPatch {
                    path: resource.path,
                    marker: resource.marker,
                    text: resource.text,
                }),
                ResourceState::Incorrect { .. } => Some(Action::ReplacePatch {
                    path: resource.path,
                    marker: resource.marker,
                    text: resource.text,
                }),
                ResourceState::Correct => None,
            }
        }
        EntryKind::JsonMerge { fragment } => {
            let resource = JsonFragmentResource::new(path, fragment.resolve(ctx));
            if resource.current_state(view)?.needs_change() {
                Some(Action::JsonMerge {
                    path: resource.path,
                    fragment: resource.fragment,
                })
            } else {
                None
            }
        }
        EntryKind::Chmod { executable } => {
            if !chmod::supported() {
                notes.push(format!(
                    "skipped {}: permission bits are not supported on this platform",
                    entry.path.display()
                ));
                return Ok(None);
            }
            let resource = ChmodResource::new(path, *executable);
            match resource.current_state(view)? {
                ResourceState::Invalid { .. } => {
                    return Err(ReconcileError::MissingChmodTarget {
                        path: resource.path,
                    });
                }
                ResourceState::Missing | ResourceState::Incorrect { .. } => Some(Action::Chmod {
                    path: resource.path,
                    executable: resource.executable,
                }),
                ResourceState::Correct => None,
            }
        }
    })
}

/// Uninstall: remove what is still recognisably this entry's.
fn plan_removal(
    entry: &ManagedEntry,
    schema: &Schema,
    later: &[ManagedEntry],
    ctx: &ProjectContext,
    view: &dyn FileSystemView,
    notes: &mut Vec<String>,
) -> Result<Option<Action>, ReconcileError> {
    let path = entry.path.clone();
    Ok(match &entry.kind {
        EntryKind::WriteFile { content } => {
            let Some(current) = view.read(&path)? else {
                return Ok(None);
            };
            let resource = FileResource::new(path, content.resolve(ctx));
            if resource.is_recognized(&current, &entry.owner)
                || matches_composed(&resource.path, &resource.content, later, ctx, &current)?
            {
                Some(Action::DeleteFile {
                    path: resource.path,
                })
            } else {
                notes.push(format!(
                    "left {} in place: content no longer recognized as {}'s",
                    resource.path.display(),
                    entry.owner
                ));
                None
            }
        }
        EntryKind::TextPatch { marker, .. } => {
            let present = view
                .read(&path)?
                .is_some_and(|content| marker.locate(&content).is_some());
            present.then(|| Action::RemovePatch {
                path,
                marker: marker.clone(),
            })
        }
        EntryKind::JsonMerge { fragment } => {
            let resource = JsonFragmentResource::new(path, fragment.resolve(ctx));
            if resource.is_present(view)? {
                Some(Action::JsonUnmerge {
                    path: resource.path,
                    fragment: resource.fragment,
                })
            } else {
                None
            }
        }
        EntryKind::Chmod { executable } => {
            if !chmod::supported() {
                return Ok(None);
            }
            if view.executable(&path)? != Some(*executable) {
                return Ok(None);
            }
            let current = view.read(&path)?.unwrap_or_default();
            if written_by_tool(entry, schema, ctx, &current) {
                Some(Action::Chmod {
                    path,
                    executable: !*executable,
                })
            } else {
                notes.push(format!(
                    "left {} {} as is: file was not written by {}",
                    if *executable { "+x on" } else { "-x on" },
                    path.display(),
                    entry.owner
                ));
                None
            }
        }
    })
}

/// Whether the target of a chmod entry is a file this tool wrote: it carries
/// the owner's signature or still holds a same-path whole-file entry's content.
fn written_by_tool(
    entry: &ManagedEntry,
    schema: &Schema,
    ctx: &ProjectContext,
    current: &str,
) -> bool {
    file::carries_signature(current, &entry.owner)
        || schema.entries.iter().any(|other| {
            other.path == entry.path
                && matches!(&other.kind, EntryKind::WriteFile { content }
                    if same_text(current, &content.resolve(ctx)))
        })
}
