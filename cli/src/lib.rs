//! Machine bootstrap engine.
//!
//! Brings a macOS or Linux machine to the state described by a dotfiles
//! repository: Homebrew and system packages, Dotbot-style `install.conf.yaml`
//! directives (`create`, `clean`, `link`, `shell`), XDG and `PATH` lines in the
//! login profile, the login shell and GitHub CLI authentication. Every step
//! checks before it changes, so a second run is a no-op.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load `install.conf.yaml`, package lists and `bootstrap.toml`
//! - **[`resources`]**: idempotent `check + apply` primitives (links, packages, profile lines, …)
//! - **[`tasks`]**: named, dependency-ordered units of work wired to resources
//! - **[`commands`]**: subcommand orchestration (`install`, `uninstall`, `check`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod privilege;
pub mod prompt;
pub mod resources;
pub mod tasks;
