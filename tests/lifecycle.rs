#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for install, upgrade, and uninstall passes.
//!
//! Each test seeds a temporary project, runs one or more lifecycle passes
//! through the same entry point the CLI uses, and inspects the files left
//! on disk.

mod common;

use std::path::PathBuf;

use common::{RecordingLog, TestProjectBuilder};
use serde_json::{Value, json};
use warden_cli::reconcile::Mode;
use warden_cli::resources::patch::Marker;
use warden_cli::schema::{ManagedEntry, Schema};

fn v1() -> semver::Version {
    semver::Version::new(1, 0, 0)
}

fn notes_schema() -> Schema {
    Schema::new(v1()).with(ManagedEntry::write_file("NOTES.md", "# Notes\n"))
}

fn link_schema() -> Schema {
    Schema::new(v1()).with(ManagedEntry::text_patch(
        "DOC.md",
        Marker::line("LINK:"),
        "LINK: x",
    ))
}

fn hooks_schema() -> Schema {
    Schema::new(v1()).with(ManagedEntry::json_merge(
        "settings.json",
        json!({"hooks": {"a": 1}}),
    ))
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn empty_project_gets_one_file_then_converges() {
    let project = TestProjectBuilder::new().build();

    let setup = project.setup(notes_schema());
    let plan = setup.plan(Mode::Install, None).unwrap();
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.actions[0].to_string(), "create NOTES.md");

    let result = project.run(notes_schema(), Mode::Install, false).unwrap();
    assert_eq!(result.created, [PathBuf::from("NOTES.md")]);
    assert_eq!(project.read("NOTES.md").as_deref(), Some("# Notes\n"));

    let again = project.setup(notes_schema());
    assert!(again.plan(Mode::Upgrade, None).unwrap().is_converged());
}

#[test]
fn text_patch_lands_above_content_and_uninstall_restores_it() {
    let project = TestProjectBuilder::new()
        .with_file("DOC.md", "# Title\nBody")
        .build();

    project.run(link_schema(), Mode::Install, false).unwrap();
    assert_eq!(
        project.read("DOC.md").as_deref(),
        Some("LINK: x\n# Title\nBody")
    );

    project.run(link_schema(), Mode::Uninstall, false).unwrap();
    assert_eq!(project.read("DOC.md").as_deref(), Some("# Title\nBody"));
}

#[test]
fn json_merge_overrides_owned_key_and_uninstall_keeps_user_keys() {
    let project = TestProjectBuilder::new()
        .with_file("settings.json", r#"{"hooks":{"a":0},"custom":true}"#)
        .build();

    project.run(hooks_schema(), Mode::Install, false).unwrap();
    assert_eq!(
        parse(&project.read("settings.json").unwrap()),
        json!({"hooks": {"a": 1}, "custom": true})
    );

    project.run(hooks_schema(), Mode::Uninstall, false).unwrap();
    assert_eq!(
        parse(&project.read("settings.json").unwrap()),
        json!({"custom": true})
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn second_install_changes_nothing() {
    let schema = || {
        notes_schema()
            .with(ManagedEntry::text_patch("DOC.md", Marker::line("LINK:"), "LINK: x"))
            .with(ManagedEntry::json_merge("settings.json", json!({"hooks": {"a": 1}})))
    };
    let project = TestProjectBuilder::new()
        .with_file("DOC.md", "# Title\n")
        .build();

    assert!(project.run(schema(), Mode::Install, false).unwrap().has_changes());
    let before = project.snapshot();
    let second = project.run(schema(), Mode::Install, false).unwrap();
    assert!(!second.has_changes());
    assert!(second.actions.is_empty());
    assert_eq!(project.snapshot(), before);
}

#[test]
fn generated_file_with_later_layers_converges_and_uninstalls() {
    let schema = || {
        Schema::new(v1())
            .with(ManagedEntry::write_file("DOC.md", "# Doc\n"))
            .with(ManagedEntry::text_patch("DOC.md", Marker::line("LINK:"), "LINK: x"))
            .with(ManagedEntry::write_file("settings.json", "{}\n"))
            .with(ManagedEntry::json_merge("settings.json", json!({"hooks": {"a": 1}})))
    };
    let project = TestProjectBuilder::new().build();
    let original = project.snapshot();

    project.run(schema(), Mode::Install, false).unwrap();
    assert_eq!(project.read("DOC.md").as_deref(), Some("LINK: x\n# Doc\n"));
    let upgrade = project.run(schema(), Mode::Upgrade, false).unwrap();
    assert!(upgrade.actions.is_empty(), "{:?}", upgrade.actions);

    let log = RecordingLog::default();
    project
        .run_logged(schema(), Mode::Uninstall, false, &log)
        .unwrap();
    assert!(log.at("warn").is_empty(), "{:?}", log.at("warn"));
    assert_eq!(project.snapshot(), original);
}

#[test]
fn upgraded_array_fragment_keeps_the_superseded_item() {
    let fragment = |script: &str| {
        json!({"hooks": {"PreToolUse": [{"matcher": "Edit", "command": script}]}})
    };
    let v1_schema = Schema::new(v1()).with(ManagedEntry::json_merge(
        "settings.json",
        fragment("old.sh"),
    ));
    let v2_schema = || {
        Schema::new(semver::Version::new(1, 1, 0)).with(ManagedEntry::json_merge(
            "settings.json",
            fragment("new.sh"),
        ))
    };
    let project = TestProjectBuilder::new()
        .with_file("settings.json", "{\"custom\": true}\n")
        .build();

    project.run(v1_schema, Mode::Install, false).unwrap();
    project.run(v2_schema(), Mode::Upgrade, false).unwrap();
    let commands: Vec<Value> = parse(&project.read("settings.json").unwrap())["hooks"]
        ["PreToolUse"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["command"].clone())
        .collect();
    assert_eq!(commands, [json!("old.sh"), json!("new.sh")]);

    project.run(v2_schema(), Mode::Uninstall, false).unwrap();
    assert_eq!(
        parse(&project.read("settings.json").unwrap()),
        json!({"custom": true, "hooks": {"PreToolUse": [{"matcher": "Edit", "command": "old.sh"}]}})
    );
}

#[test]
fn user_content_around_a_patch_survives_upgrade() {
    let old = Schema::new(v1()).with(ManagedEntry::text_patch(
        "DOC.md",
        Marker::line("LINK:"),
        "LINK: old",
    ));
    let new = Schema::new(semver::Version::new(1, 1, 0)).with(ManagedEntry::text_patch(
        "DOC.md",
        Marker::line("LINK:"),
        "LINK: new",
    ));
    let project = TestProjectBuilder::new()
        .with_file("DOC.md", "# Title\nBody\n")
        .build();

    project.run(old, Mode::Install, false).unwrap();
    project.write(
        "DOC.md",
        &format!("{}More notes\n", project.read("DOC.md").unwrap()),
    );

    let result = project.run(new, Mode::Upgrade, false).unwrap();
    assert_eq!(result.updated, [PathBuf::from("DOC.md")]);
    assert_eq!(
        project.read("DOC.md").as_deref(),
        Some("LINK: new\n# Title\nBody\nMore notes\n")
    );
    assert_eq!(project.read(".warden/version").as_deref(), Some("1.1.0\n"));
}

#[test]
fn dry_run_is_pure_and_matches_real_run() {
    let project = TestProjectBuilder::new()
        .with_file("DOC.md", "# Title\nBody")
        .with_file("settings.json", r#"{"custom":true}"#)
        .build();
    let schema = || {
        notes_schema()
            .with(ManagedEntry::text_patch("DOC.md", Marker::line("LINK:"), "LINK: x"))
            .with(ManagedEntry::json_merge("settings.json", json!({"hooks": {"a": 1}})))
    };

    let before = project.snapshot();
    let log = RecordingLog::default();
    let simulated = project.run_logged(schema(), Mode::Install, true, &log).unwrap();
    assert_eq!(project.snapshot(), before);
    assert_eq!(log.at("dry_run").len(), simulated.actions.len() + 1);

    let real = project.run(schema(), Mode::Install, false).unwrap();
    assert_eq!(simulated, real);
}

#[test]
fn uninstall_leaves_unrecognized_files_with_a_note() {
    let project = TestProjectBuilder::new().build();
    project.run(notes_schema(), Mode::Install, false).unwrap();
    project.write("NOTES.md", "my own notes\n");

    let log = RecordingLog::default();
    let result = project
        .run_logged(notes_schema(), Mode::Uninstall, false, &log)
        .unwrap();
    assert!(result.removed.is_empty());
    assert_eq!(project.read("NOTES.md").as_deref(), Some("my own notes\n"));
    assert!(log.at("warn").iter().any(|m| m.contains("left NOTES.md in place")));
}

#[test]
fn signed_file_is_removed_even_after_edits() {
    let schema = || {
        Schema::new(v1()).with(ManagedEntry::write_file(
            "NOTES.md",
            "<!-- managed-by: warden -->\n# Notes\n",
        ))
    };
    let project = TestProjectBuilder::new().build();
    project.run(schema(), Mode::Install, false).unwrap();
    project.write("NOTES.md", "<!-- managed-by: warden -->\n# Notes\nlocal tweak\n");

    let result = project.run(schema(), Mode::Uninstall, false).unwrap();
    assert_eq!(result.removed, [PathBuf::from("NOTES.md")]);
    assert!(project.snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Version guard
// ---------------------------------------------------------------------------

#[test]
fn upgrade_requires_an_install() {
    let project = TestProjectBuilder::new().build();
    let err = project
        .run(notes_schema(), Mode::Upgrade, false)
        .unwrap_err();
    assert!(err.to_string().contains("nothing is installed"));
    assert!(project.snapshot().is_empty());
}

#[test]
fn newer_installed_version_is_refused() {
    let project = TestProjectBuilder::new()
        .with_file(".warden/version", "9.0.0\n")
        .build();
    let err = project
        .run(notes_schema(), Mode::Install, false)
        .unwrap_err();
    assert!(err.to_string().contains("refusing to downgrade"));
    assert!(project.read("NOTES.md").is_none());
}

#[test]
fn missing_patch_target_is_fatal() {
    let project = TestProjectBuilder::new().build();
    let err = project.run(link_schema(), Mode::Install, false).unwrap_err();
    assert!(err.to_string().contains("DOC.md does not exist"));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn excluded_paths_are_never_touched() {
    let project = TestProjectBuilder::new()
        .with_file("warden.toml", "exclude = [\"NOTES.md\"]\n")
        .build();
    let result = project.run(notes_schema(), Mode::Install, false).unwrap();
    assert!(!result.has_changes());
    assert!(project.read("NOTES.md").is_none());
}

#[test]
fn owner_scoped_uninstall_keeps_other_owners_and_marker() {
    let schema = || {
        notes_schema().with(ManagedEntry::write_file("PY.md", "# Python\n").owned_by("python"))
    };
    let project = TestProjectBuilder::new().build();
    project.run(schema(), Mode::Install, false).unwrap();

    let setup = project.setup(schema());
    let opts = warden_cli::commands::RunOptions {
        owner: Some("python".to_string()),
        ..Default::default()
    };
    let result = warden_cli::commands::run_lifecycle(
        &setup,
        Mode::Uninstall,
        &opts,
        &warden_cli::exec::SystemExecutor,
        &RecordingLog::default(),
    )
    .unwrap();
    assert_eq!(result.removed, [PathBuf::from("PY.md")]);
    assert!(project.read("NOTES.md").is_some());
    assert!(project.read(".warden/version").is_some());
}
