//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::reconcile::Mode;

/// Top-level CLI entry point for the reconciliation engine.
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    about = "Install, upgrade, and remove managed configuration artifacts",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "WARDEN_ROOT")]
    pub root: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bootstrap managed artifacts into the project
    Install(InstallOpts),
    /// Bring an installed project up to the current schema
    Upgrade(InstallOpts),
    /// Remove managed artifacts
    Uninstall(UninstallOpts),
    /// Show what a lifecycle operation would change
    Diff(DiffOpts),
    /// Exit non-zero unless the project is converged
    Check,
    /// Print version information
    Version,
}

/// Options for the `install` and `upgrade` subcommands.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Install missing packages with the detected package manager
    #[arg(long)]
    pub install_deps: bool,
}

/// Options for the `uninstall` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UninstallOpts {
    /// Also remove full-teardown artifacts (lint configuration)
    #[arg(long)]
    pub full: bool,

    /// Only remove entries owned by this pack
    #[arg(long)]
    pub owner: Option<String>,

    /// Remove packages only the removed artifacts needed
    #[arg(long)]
    pub remove_deps: bool,
}

/// Options for the `diff` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DiffOpts {
    /// Append a unified diff of every added or modified file
    #[arg(short, long)]
    pub patch: bool,

    /// Lifecycle operation to preview (upgrade when installed, install otherwise)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

/// Lifecycle mode as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Install.
    Install,
    /// Upgrade.
    Upgrade,
    /// Uninstall standard-tier artifacts.
    Uninstall,
    /// Uninstall everything.
    UninstallFull,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Install => Self::Install,
            ModeArg::Upgrade => Self::Upgrade,
            ModeArg::Uninstall => Self::Uninstall,
            ModeArg::UninstallFull => Self::UninstallFull,
        }
    }
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Upgrade(_) => "upgrade",
            Self::Uninstall(_) => "uninstall",
            Self::Diff(_) => "diff",
            Self::Check => "check",
            Self::Version => "version",
        }
    }
}
