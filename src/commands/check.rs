//! Health check: is the project converged with this schema?
use anyhow::{Result, bail};
use semver::Version;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::{Log, Logger};
use crate::reconcile::{Action, Mode};
use crate::state;

/// Outcome of a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Health {
    /// Version recorded in the marker.
    pub installed: Option<Version>,
    /// Version of the schema.
    pub schema: Version,
    /// Actions an upgrade (or install) would perform.
    pub pending: Vec<Action>,
    /// Packages managed artifacts need that the project does not declare.
    pub missing_packages: Vec<String>,
}

impl Health {
    /// Human-readable problems; empty when healthy.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        match &self.installed {
            None => problems.push("not installed".to_string()),
            Some(v) if *v < self.schema => {
                problems.push(format!("installed {v} is older than schema {}", self.schema));
            }
            Some(_) => {}
        }
        problems.extend(self.pending.iter().map(|a| format!("pending: {a}")));
        if !self.missing_packages.is_empty() {
            problems.push(format!(
                "missing packages: {}",
                self.missing_packages.join(", ")
            ));
        }
        problems
    }

    /// Whether nothing needs doing.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.problems().is_empty()
    }
}

/// Evaluate the project without modifying it.
///
/// # Errors
///
/// Returns an error if the marker cannot be read or planning fails.
pub fn evaluate(setup: &CommandSetup) -> Result<Health> {
    let installed = state::read_installed(&setup.root)?;
    let mode = if installed.is_some() {
        Mode::Upgrade
    } else {
        Mode::Install
    };
    let plan = setup.plan(mode, None)?;
    Ok(Health {
        installed,
        schema: setup.schema.version.clone(),
        pending: plan.actions,
        missing_packages: plan.packages_to_install,
    })
}

/// Log the health report; fail when unhealthy.
///
/// # Errors
///
/// Returns an error naming the number of problems when unhealthy.
pub fn report(health: &Health, log: &dyn Log) -> Result<()> {
    log.stage("Health");
    let problems = health.problems();
    if problems.is_empty() {
        log.info(&format!("converged with schema {}", health.schema));
        return Ok(());
    }
    for problem in &problems {
        log.warn(problem);
    }
    bail!("project is not converged ({} problem(s))", problems.len())
}

/// Run the check command.
///
/// # Errors
///
/// Returns an error if the project is not converged.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    report(&evaluate(&setup)?, log)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::{Level, MemoryLog};
    use std::path::PathBuf;

    fn health() -> Health {
        Health {
            installed: Some(Version::new(1, 4, 0)),
            schema: Version::new(1, 4, 0),
            pending: vec![],
            missing_packages: vec![],
        }
    }

    #[test]
    fn converged_project_is_healthy() {
        let log = MemoryLog::default();
        assert!(health().is_healthy());
        report(&health(), &log).unwrap();
        assert!(log.contains(Level::Info, "converged"));
    }

    #[test]
    fn pending_actions_are_unhealthy() {
        let h = Health {
            pending: vec![Action::DeleteFile {
                path: PathBuf::from("old.md"),
            }],
            ..health()
        };
        assert_eq!(h.problems(), ["pending: delete old.md"]);
        let log = MemoryLog::default();
        assert!(report(&h, &log).is_err());
        assert!(log.contains(Level::Warn, "pending: delete old.md"));
    }

    #[test]
    fn missing_packages_are_unhealthy() {
        let h = Health {
            missing_packages: vec!["prettier".to_string()],
            ..health()
        };
        assert_eq!(h.problems(), ["missing packages: prettier"]);
    }

    #[test]
    fn outdated_and_missing_marker() {
        let outdated = Health {
            installed: Some(Version::new(1, 2, 0)),
            ..health()
        };
        assert_eq!(
            outdated.problems(),
            ["installed 1.2.0 is older than schema 1.4.0"]
        );
        let missing = Health {
            installed: None,
            ..health()
        };
        assert_eq!(missing.problems(), ["not installed"]);
    }
}
