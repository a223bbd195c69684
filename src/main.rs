use anyhow::Result;
use clap::Parser;

use warden_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    if matches!(args.command, cli::Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let command = args.command.name();
    logging::init_subscriber(args.verbose, command);
    let log = logging::Logger::new(command);

    let outcome = match &args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        cli::Command::Upgrade(opts) => commands::upgrade::run(&args.global, opts, &log),
        cli::Command::Uninstall(opts) => commands::uninstall::run(&args.global, opts, &log),
        cli::Command::Diff(opts) => commands::diff::run(&args.global, opts, &log),
        cli::Command::Check => commands::check::run(&args.global, &log),
        cli::Command::Version => Ok(()),
    };
    if let Err(e) = &outcome {
        log.error(&format!("{e:#}"));
    }
    outcome
}
