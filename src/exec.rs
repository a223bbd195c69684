//! External command execution and the package-manager collaborator.
use anyhow::{Context as _, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

use crate::context::PackageManager;
use crate::error::ReconcileError;

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs external programs.
///
/// Commands take `&dyn Executor` so tests can substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run `program` with `args` in `dir`, failing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult>;

    /// Whether `program` is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("failed to execute: {program} in {}", dir.display()))?;
        let result = ExecResult::from(output);
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Arguments that add `packages` as development dependencies.
#[must_use]
pub fn install_args(manager: PackageManager, packages: &[String]) -> Vec<String> {
    let verb: &[&str] = match manager {
        PackageManager::Npm => &["install", "--save-dev"],
        PackageManager::Pnpm | PackageManager::Yarn | PackageManager::Bun => &["add", "--dev"],
    };
    verb.iter()
        .map(ToString::to_string)
        .chain(packages.iter().cloned())
        .collect()
}

/// Arguments that remove `packages`.
#[must_use]
pub fn remove_args(manager: PackageManager, packages: &[String]) -> Vec<String> {
    let verb = match manager {
        PackageManager::Npm => "uninstall",
        PackageManager::Pnpm | PackageManager::Yarn | PackageManager::Bun => "remove",
    };
    std::iter::once(verb.to_string())
        .chain(packages.iter().cloned())
        .collect()
}

/// Install `packages` with `manager` in `root`.
///
/// Does nothing when `packages` is empty.
///
/// # Errors
///
/// Returns [`ReconcileError::ExternalDependencyFailure`] if the manager is
/// not on `PATH` or the command fails.
pub fn install_packages(
    executor: &dyn Executor,
    root: &Path,
    manager: PackageManager,
    packages: &[String],
) -> Result<(), ReconcileError> {
    invoke(executor, root, manager, "install", packages, install_args(manager, packages))
}

/// Remove `packages` with `manager` in `root`.
///
/// # Errors
///
/// Returns [`ReconcileError::ExternalDependencyFailure`] if the manager is
/// not on `PATH` or the command fails.
pub fn remove_packages(
    executor: &dyn Executor,
    root: &Path,
    manager: PackageManager,
    packages: &[String],
) -> Result<(), ReconcileError> {
    invoke(executor, root, manager, "remove", packages, remove_args(manager, packages))
}

fn invoke(
    executor: &dyn Executor,
    root: &Path,
    manager: PackageManager,
    verb: &'static str,
    packages: &[String],
    args: Vec<String>,
) -> Result<(), ReconcileError> {
    if packages.is_empty() {
        return Ok(());
    }
    let failure = |reason: String| ReconcileError::ExternalDependencyFailure {
        manager: manager.to_string(),
        verb,
        packages: packages.to_vec(),
        reason,
    };
    if !executor.which(manager.command()) {
        return Err(failure(format!("{manager} not found on PATH")));
    }
    executor
        .run_in(root, manager.command(), &args)
        .map(|_| ())
        .map_err(|e| failure(format!("{e:#}")))
}
