use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotfiles_bootstrap::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let name = match &args.command {
        cli::Command::Install(_) => "install",
        cli::Command::Uninstall => "uninstall",
        cli::Command::Check(_) => "check",
        cli::Command::Completions(opts) => {
            commands::completions::run(opts.shell);
            return Ok(());
        }
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
    };
    let json = matches!(&args.command, cli::Command::Check(opts) if opts.json);
    logging::init_subscriber(args.verbose, name, json);

    let host = commands::Host::detect()?;
    let log = Arc::new(logging::Logger::new(name));
    if let Err(e) = commands::install_interrupt_handler() {
        log.warn(&format!("{e:#}"));
    }

    match &args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, opts, &host, &log),
        cli::Command::Uninstall => commands::uninstall::run(&args.global, &host, &log),
        cli::Command::Check(opts) => commands::check::run(&args.global, opts, &host, &log),
        cli::Command::Completions(_) | cli::Command::Version => Ok(()),
    }
}
