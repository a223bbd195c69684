// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed host project, a fluent builder for
// seeding it, and an in-memory `Log` so each integration test can drive the
// engine without a global tracing subscriber.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use warden_cli::cli::GlobalOpts;
use warden_cli::commands::{self, CommandSetup, RunOptions};
use warden_cli::exec::SystemExecutor;
use warden_cli::logging::Log;
use warden_cli::reconcile::{Mode, ReconcileResult};
use warden_cli::schema::Schema;

/// [`Log`] implementation that records every message.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLog {
    fn push(&self, level: &'static str, msg: &str) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push((level, msg.to_string()));
        }
    }

    /// Messages recorded at `level` (`"stage"`, `"info"`, `"warn"`, ...).
    pub fn at(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .expect("log mutex")
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
}

/// An isolated host project backed by a [`tempfile::TempDir`].
pub struct TestProject {
    /// Temporary directory containing the project.
    pub root: tempfile::TempDir,
}

impl TestProject {
    /// An empty project.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path to the project root.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `relative`.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, content).expect("write file");
    }

    /// Content of `relative`, `None` if absent.
    pub fn read(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.join(relative)).ok()
    }

    /// Every file under the root as `(relative path, content)`, sorted.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, String)>) {
            for entry in std::fs::read_dir(dir).expect("read dir") {
                let path = entry.expect("dir entry").path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let relative = path
                        .strip_prefix(root)
                        .expect("under root")
                        .to_string_lossy()
                        .replace('\\', "/");
                    let content = std::fs::read_to_string(&path).unwrap_or_default();
                    out.push((relative, content));
                }
            }
        }
        let mut out = Vec::new();
        walk(self.path(), self.path(), &mut out);
        out.sort();
        out
    }

    /// Global options pointing at this project.
    pub fn global(&self, dry_run: bool) -> GlobalOpts {
        GlobalOpts {
            dry_run,
            root: Some(self.path().to_path_buf()),
        }
    }

    /// Detect the project against `schema`.
    pub fn setup(&self, schema: Schema) -> CommandSetup {
        CommandSetup::with_schema(&self.global(false), schema, &RecordingLog::default())
            .expect("command setup")
    }

    /// Run `mode` with `schema`, detecting the project afresh.
    pub fn run(&self, schema: Schema, mode: Mode, dry_run: bool) -> anyhow::Result<ReconcileResult> {
        self.run_logged(schema, mode, dry_run, &RecordingLog::default())
    }

    /// Like [`TestProject::run`] with a caller-supplied log.
    pub fn run_logged(
        &self,
        schema: Schema,
        mode: Mode,
        dry_run: bool,
        log: &RecordingLog,
    ) -> anyhow::Result<ReconcileResult> {
        let setup = self.setup(schema);
        let opts = RunOptions {
            dry_run,
            ..RunOptions::default()
        };
        commands::run_lifecycle(&setup, mode, &opts, &SystemExecutor, log)
    }
}

/// Fluent builder for [`TestProject`].
pub struct TestProjectBuilder {
    project: TestProject,
}

impl TestProjectBuilder {
    /// Begin building an empty project.
    pub fn new() -> Self {
        Self {
            project: TestProject::new(),
        }
    }

    /// Seed a file.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        self.project.write(relative, content);
        self
    }

    /// Seed a JavaScript project managed by npm.
    pub fn with_npm_package(self, manifest: &str) -> Self {
        self.with_file("package.json", manifest)
            .with_file("package-lock.json", "{}\n")
    }

    /// Finish building.
    pub fn build(self) -> TestProject {
        self.project
    }
}
