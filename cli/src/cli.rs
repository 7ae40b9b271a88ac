use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the machine bootstrap tool.
#[derive(Parser, Debug)]
#[command(
    name = "bootstrap",
    about = "Bootstrap a macOS or Linux machine from a dotfiles repository",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, visible_alias = "debug", global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Settings file, relative to the root (default conf/bootstrap.toml)
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Check and apply links and directories in parallel
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Never start the sudo keep-alive loop
    #[arg(long, global = true)]
    pub no_sudo: bool,

    /// Answer every `ask` toggle with yes
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install packages, link dotfiles and configure the shell
    Install(InstallOpts),
    /// Replace links with copies and remove profile lines
    Uninstall,
    /// Validate configuration and report drift without changing anything
    Check(CheckOpts),
    /// Print shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Skip tasks whose name contains any of these
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only tasks whose name contains any of these
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct CheckOpts {
    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_dry_run_short() {
        let cli = Cli::parse_from(["bootstrap", "-d", "install"]);
        assert!(cli.global.dry_run);
        assert!(matches!(cli.command, Command::Install(_)));
    }

    #[test]
    fn parse_install_skip_and_only() {
        let cli = Cli::parse_from(["bootstrap", "install", "--skip", "packages,shell"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.skip, ["packages", "shell"]);

        let cli = Cli::parse_from(["bootstrap", "install", "--only", "symlinks"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.only, ["symlinks"]);
    }

    #[test]
    fn verbose_has_debug_alias() {
        assert!(Cli::parse_from(["bootstrap", "-v", "install"]).verbose);
        assert!(Cli::parse_from(["bootstrap", "install", "--debug"]).verbose);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "bootstrap",
            "uninstall",
            "--root",
            "/tmp/dotfiles",
            "--config",
            "conf/work.toml",
            "--parallel",
            "--no-sudo",
            "-y",
        ]);
        assert!(matches!(cli.command, Command::Uninstall));
        assert_eq!(cli.global.root, Some("/tmp/dotfiles".into()));
        assert_eq!(cli.global.config, Some("conf/work.toml".into()));
        assert!(cli.global.parallel && cli.global.no_sudo && cli.global.yes);
    }

    #[test]
    fn parse_check_json() {
        let cli = Cli::parse_from(["bootstrap", "check", "--json"]);
        assert!(matches!(cli.command, Command::Check(CheckOpts { json: true })));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["bootstrap", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Command::Completions(CompletionsOpts {
                shell: clap_complete::Shell::Zsh
            })
        ));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["bootstrap", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }
}
