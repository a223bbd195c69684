//! Top-level subcommand orchestration.
//!
//! Every lifecycle command shares the same sequence: resolve the root, load
//! `warden.toml`, detect the project, validate the schema, guard against the
//! installed version, plan, apply, and update the version marker.
pub mod check;
pub mod diff;
pub mod install;
pub mod uninstall;
pub mod upgrade;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::ProjectConfig;
use crate::context::ProjectContext;
use crate::exec::{self, Executor};
use crate::logging::Log;
use crate::operations::DiskView;
use crate::reconcile::staging::Staging;
use crate::reconcile::{self, Mode, Plan, ReconcileResult};
use crate::schema::Schema;
use crate::state;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Canonical project root.
    pub root: PathBuf,
    /// Loaded `warden.toml`.
    pub config: ProjectConfig,
    /// Detected project facts.
    pub context: ProjectContext,
    /// Validated schema.
    pub schema: Schema,
}

impl CommandSetup {
    /// Resolve the root, load configuration, and detect the project against
    /// the built-in schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist, the configuration is
    /// invalid, or the schema fails validation.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        Self::with_schema(global, Schema::builtin(), log)
    }

    /// Like [`CommandSetup::init`] with an explicit schema.
    ///
    /// # Errors
    ///
    /// See [`CommandSetup::init`].
    pub fn with_schema(global: &GlobalOpts, schema: Schema, log: &dyn Log) -> Result<Self> {
        let root = resolve_root(global)?;
        log.debug(&format!("project root: {}", root.display()));

        log.stage("Loading configuration");
        let config = ProjectConfig::load(&root)?;
        if !config.exclude.is_empty() {
            log.debug(&format!("{} excluded path(s)", config.exclude.len()));
        }

        log.stage("Detecting project");
        let context = ProjectContext::detect(&root, &config)?;
        log.debug(&format!("languages: {:?}", context.languages));
        if let Some(pm) = context.package_manager {
            log.info(&format!("package manager: {pm}"));
        }
        if !context.frameworks.is_empty() {
            log.debug(&format!(
                "frameworks: {}",
                context.frameworks.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        if !context.packs.is_empty() {
            log.info(&format!(
                "packs: {}",
                context.packs.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        schema
            .validate(&context)
            .context("built-in schema is invalid")?;
        log.debug(&format!(
            "schema {} with {} entries",
            schema.version,
            schema.entries.len()
        ));

        Ok(Self {
            root,
            config,
            context,
            schema,
        })
    }

    /// Plan `mode` over the on-disk project.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails.
    pub fn plan(&self, mode: Mode, owner: Option<&str>) -> Result<Plan> {
        let view = DiskView::new(&self.root);
        Ok(reconcile::plan_for_owner(
            &self.schema,
            mode,
            &self.context,
            &view,
            owner,
        )?)
    }
}

/// Resolve the project root from `--root`/`WARDEN_ROOT` or the current
/// directory.
///
/// # Errors
///
/// Returns an error if the directory does not exist.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    dunce::canonicalize(&root)
        .with_context(|| format!("project root {} does not exist", root.display()))
}

/// How a lifecycle pass runs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Simulate only.
    pub dry_run: bool,
    /// Restrict to entries with this owner.
    pub owner: Option<String>,
    /// Invoke the package manager for the packages the result lists.
    pub manage_packages: bool,
}

/// Run one lifecycle pass and return its result.
///
/// Package-manager failures are logged with manual instructions and do not
/// fail the pass.
///
/// # Errors
///
/// Returns an error if the version guard refuses the mode, or planning,
/// applying, or updating the version marker fails.
pub fn run_lifecycle(
    setup: &CommandSetup,
    mode: Mode,
    opts: &RunOptions,
    executor: &dyn Executor,
    log: &dyn Log,
) -> Result<ReconcileResult> {
    let root = &setup.root;
    let installed = state::read_installed(root)?;
    state::guard(root, mode, installed.as_ref(), &setup.schema.version)?;
    if let Some(version) = &installed {
        log.info(&format!(
            "installed {version}, schema {}",
            setup.schema.version
        ));
    }

    log.stage(&format!("Planning {mode}"));
    let plan = setup.plan(mode, opts.owner.as_deref())?;
    for path in &plan.excluded {
        log.debug(&format!("excluded by configuration: {}", path.display()));
    }
    for note in &plan.notes {
        log.warn(note);
    }
    log.info(&format!("{} action(s)", plan.actions.len()));

    let leftovers = if mode == Mode::Uninstall && opts.owner.is_none() {
        full_only_leftovers(setup, &plan)?
    } else {
        0
    };

    log.stage("Applying");
    let result = reconcile::apply(&plan, root, opts.dry_run, log)?;

    update_marker(setup, mode, opts, leftovers, log)?;

    if opts.manage_packages {
        let packages = if mode.is_removal() {
            &result.packages_to_remove
        } else {
            &result.packages_to_install
        };
        manage_packages(setup, mode, packages, opts.dry_run, executor, log);
    }

    Ok(result)
}

/// Number of artifacts a full uninstall would still touch once `plan` has
/// been applied.
fn full_only_leftovers(setup: &CommandSetup, plan: &Plan) -> Result<usize> {
    let disk = DiskView::new(&setup.root);
    let mut after = Staging::new(&disk);
    after.apply_all(&plan.actions)?;
    let rest = reconcile::plan(&setup.schema, Mode::UninstallFull, &setup.context, &after)?;
    Ok(rest.actions.len())
}

fn update_marker(
    setup: &CommandSetup,
    mode: Mode,
    opts: &RunOptions,
    leftovers: usize,
    log: &dyn Log,
) -> Result<()> {
    let marker = state::marker_path();
    if mode.is_removal() {
        // A scoped uninstall leaves the rest of the installation in place.
        if opts.owner.is_some() {
            return Ok(());
        }
        if leftovers > 0 {
            log.info(&format!(
                "kept {}: {leftovers} full-only artifact(s) remain; \
                 run `warden uninstall --full` to remove them",
                marker.display()
            ));
            return Ok(());
        }
        if opts.dry_run {
            log.dry_run(&format!("would remove {}", marker.display()));
        } else {
            state::remove_installed(&setup.root)?;
        }
    } else if opts.dry_run {
        log.dry_run(&format!(
            "would record version {} in {}",
            setup.schema.version,
            marker.display()
        ));
    } else {
        state::write_installed(&setup.root, &setup.schema.version)?;
        log.debug(&format!("recorded version {}", setup.schema.version));
    }
    Ok(())
}

fn manage_packages(
    setup: &CommandSetup,
    mode: Mode,
    packages: &[String],
    dry_run: bool,
    executor: &dyn Executor,
    log: &dyn Log,
) {
    if packages.is_empty() {
        return;
    }
    let Some(manager) = setup.context.package_manager else {
        log.warn(&format!(
            "no package manager detected; install manually: {}",
            packages.join(" ")
        ));
        return;
    };
    let (outcome, args) = if mode.is_removal() {
        if dry_run {
            log.dry_run(&format!("would run {manager} to remove {}", packages.join(", ")));
            return;
        }
        log.stage("Removing packages");
        (
            exec::remove_packages(executor, &setup.root, manager, packages),
            exec::remove_args(manager, packages),
        )
    } else {
        if dry_run {
            log.dry_run(&format!("would run {manager} to install {}", packages.join(", ")));
            return;
        }
        log.stage("Installing packages");
        (
            exec::install_packages(executor, &setup.root, manager, packages),
            exec::install_args(manager, packages),
        )
    };
    match outcome {
        Ok(()) => log.info(&format!("{manager}: {}", packages.join(", "))),
        Err(e) => {
            log.warn(&e.to_string());
            log.warn(&format!("run manually: {manager} {}", args.join(" ")));
        }
    }
}
