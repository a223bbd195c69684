//! Managed-artifact reconciliation engine.
//!
//! Installs, upgrades, and removes the configuration artifacts a tool owns
//! inside a host project (documentation guides, hook scripts, editor rule
//! files, lint configuration, JSON settings fragments) while leaving every
//! byte the user wrote untouched.
//!
//! The public API is organised into layers:
//!
//! - **[`context`]**: read-only facts about the host project
//! - **[`schema`]**: the declarative, versioned description of desired state
//! - **[`resources`]**: per-kind state primitives (whole files, marked text regions, JSON fragments, permission bits)
//! - **[`reconcile`]**: planner, executor, and diff presenter
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `upgrade`, `uninstall`, `diff`, `check`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod logging;
pub mod operations;
pub mod reconcile;
pub mod resources;
pub mod schema;
pub mod state;
