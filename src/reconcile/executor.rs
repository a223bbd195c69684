//! Action executor.
//!
//! Replays a plan through [`Staging`] over the on-disk project, then writes
//! each touched file exactly once in first-touch order.  Permission changes
//! follow content writes, and directories emptied by removals are pruned
//! afterwards.  Under dry-run nothing is written but the classification is
//! computed from the same staged changes.
use std::path::Path;

use super::staging::{StagedChange, Staging};
use super::{Plan, ReconcileResult};
use crate::error::ReconcileError;
use crate::logging::Log;
use crate::operations::DiskView;
use crate::resources::{chmod, fs};

/// Apply `plan` to the project at `root`.
///
/// # Errors
///
/// Returns an error if a file cannot be read, parsed, written, or removed.
/// The first failure aborts the remaining writes.
pub fn apply(
    plan: &Plan,
    root: &Path,
    dry_run: bool,
    log: &dyn Log,
) -> Result<ReconcileResult, ReconcileError> {
    let view = DiskView::new(root);
    let mut staging = Staging::new(&view);
    staging.apply_all(&plan.actions)?;
    let changes = staging.changes();

    let mut result = ReconcileResult {
        actions: plan.actions.clone(),
        packages_to_install: plan.packages_to_install.clone(),
        packages_to_remove: plan.packages_to_remove.clone(),
        ..ReconcileResult::default()
    };

    for change in &changes {
        if change.is_created() {
            result.created.push(change.path.clone());
        } else if change.is_removed() {
            result.removed.push(change.path.clone());
        } else if !change.is_unchanged() {
            result.updated.push(change.path.clone());
        }
    }

    if dry_run {
        for action in &plan.actions {
            log.dry_run(&format!("would {action}"));
        }
        return Ok(result);
    }

    for change in changes.iter().filter(|c| c.content_changed()) {
        write_content(root, change, log)?;
    }

    for change in changes.iter().filter(|c| c.mode_changed()) {
        if let Some(executable) = change.executable_after {
            let target = root.join(&change.path);
            chmod::set_executable(&target, executable)
                .map_err(|e| ReconcileError::io("chmod", &change.path, e))?;
            log.debug(&format!(
                "{} {}",
                if executable { "chmod +x" } else { "chmod -x" },
                change.path.display()
            ));
        }
    }

    for change in changes.iter().filter(|c| c.is_removed()) {
        if let Some(parent) = root.join(&change.path).parent() {
            for dir in fs::prune_empty_dirs(root, parent)? {
                log.debug(&format!("removed empty directory {}", dir.display()));
            }
        }
    }

    Ok(result)
}

fn write_content(root: &Path, change: &StagedChange, log: &dyn Log) -> Result<(), ReconcileError> {
    let target = root.join(&change.path);
    match &change.after {
        Some(content) => {
            fs::ensure_parent_dir(&target)?;
            std::fs::write(&target, content)
                .map_err(|e| ReconcileError::io("write", &change.path, e))?;
            log.debug(&format!("wrote {}", change.path.display()));
        }
        None => {
            fs::remove_existing(&target)?;
            log.debug(&format!("removed {}", change.path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use crate::reconcile::{Action, Mode};
    use crate::resources::patch::Marker;
    use serde_json::json;
    use std::path::PathBuf;

    fn plan_of(actions: Vec<Action>) -> Plan {
        let mut plan = Plan::new(Mode::Install);
        plan.actions = actions;
        plan
    }

    #[test]
    fn creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_of(vec![Action::CreateFile {
            path: PathBuf::from("a/b/NOTES.md"),
            content: "# Notes\n".to_string(),
        }]);
        let result = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert_eq!(result.created, [PathBuf::from("a/b/NOTES.md")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a/b/NOTES.md")).unwrap(),
            "# Notes\n"
        );
    }

    #[test]
    fn dry_run_writes_nothing_but_classifies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DOC.md"), "# Title\nBody").unwrap();
        let plan = plan_of(vec![
            Action::CreateFile {
                path: PathBuf::from("NOTES.md"),
                content: "n".to_string(),
            },
            Action::InsertPatch {
                path: PathBuf::from("DOC.md"),
                marker: Marker::line("LINK:"),
                text: "LINK: x".to_string(),
            },
        ]);
        let log = MemoryLog::default();
        let simulated = apply(&plan, dir.path(), true, &log).unwrap();
        assert!(!dir.path().join("NOTES.md").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("DOC.md")).unwrap(),
            "# Title\nBody"
        );
        assert_eq!(log.dry_run_count(), 2);

        let real = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert_eq!(simulated, real);
    }

    #[test]
    fn multiple_patches_to_one_file_write_once_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DOC.md"), "Body\n").unwrap();
        let plan = plan_of(vec![
            Action::InsertPatch {
                path: PathBuf::from("DOC.md"),
                marker: Marker::line("SECOND:"),
                text: "SECOND: b".to_string(),
            },
            Action::InsertPatch {
                path: PathBuf::from("DOC.md"),
                marker: Marker::line("FIRST:"),
                text: "FIRST: a".to_string(),
            },
        ]);
        let result = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert_eq!(result.updated, [PathBuf::from("DOC.md")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("DOC.md")).unwrap(),
            "FIRST: a\nSECOND: b\nBody\n"
        );
    }

    #[test]
    fn json_merge_creates_pretty_document() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_of(vec![Action::JsonMerge {
            path: PathBuf::from(".claude/settings.json"),
            fragment: json!({"hooks": {"a": 1}}),
        }]);
        let result = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert_eq!(result.created, [PathBuf::from(".claude/settings.json")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
            "{\n  \"hooks\": {\n    \"a\": 1\n  }\n}\n"
        );
    }

    #[test]
    fn removal_prunes_emptied_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".tool/guides")).unwrap();
        std::fs::create_dir_all(root.join(".tool/user")).unwrap();
        std::fs::write(root.join(".tool/guides/a.md"), "a").unwrap();
        std::fs::write(root.join(".tool/user/mine.md"), "mine").unwrap();

        let plan = plan_of(vec![Action::DeleteFile {
            path: PathBuf::from(".tool/guides/a.md"),
        }]);
        let result = apply(&plan, root, false, &MemoryLog::default()).unwrap();
        assert_eq!(result.removed, [PathBuf::from(".tool/guides/a.md")]);
        assert!(!root.join(".tool/guides").exists());
        assert!(root.join(".tool/user/mine.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn chmod_is_classified_as_update() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.sh"), "#!/bin/sh\n").unwrap();
        let plan = plan_of(vec![Action::Chmod {
            path: PathBuf::from("run.sh"),
            executable: true,
        }]);
        let result = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert_eq!(result.updated, [PathBuf::from("run.sh")]);
        assert!(chmod::is_executable(
            &std::fs::metadata(dir.path().join("run.sh")).unwrap()
        ));
    }

    #[test]
    fn unmerge_without_owned_values_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s.json"), "{\"user\":1}").unwrap();
        let plan = plan_of(vec![Action::JsonUnmerge {
            path: PathBuf::from("s.json"),
            fragment: json!({"hooks": {"a": 1}}),
        }]);
        let result = apply(&plan, dir.path(), false, &MemoryLog::default()).unwrap();
        assert!(!result.has_changes());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("s.json")).unwrap(),
            "{\"user\":1}"
        );
    }
}
