#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for the `uninstall` command: links become copies and
//! the lines `install` added to the profile are removed.

mod common;

use std::sync::Arc;

use common::{RecordingExecutor, Sandbox, logger};
use dotfiles_bootstrap::cli::{GlobalOpts, InstallOpts};
use dotfiles_bootstrap::commands::{install, uninstall};
use dotfiles_bootstrap::tasks;

fn sandbox() -> Sandbox {
    Sandbox::new()
        .links("- link:\n    ~/.vimrc:\n    ~/.config/git:\n      path: git\n")
        .write("vimrc", "set number\n")
        .write("git/config", "[user]\n\tname = Test\n")
        .write(
            "conf/bootstrap.toml",
            "[shell]\nchange = \"no\"\n\n[github]\nauth = \"no\"\n\n[profile]\nfile = \"~/.profile\"\nlines = [\"umask 022\"]\n",
        )
}

fn run_both(sandbox: &Sandbox, user_profile: &str) {
    std::fs::write(sandbox.home_path().join(".profile"), user_profile).unwrap();
    let exec = Arc::new(RecordingExecutor::new());
    let host = sandbox.host(exec);
    install::run(&GlobalOpts::default(), &InstallOpts::default(), &host, &logger("install")).unwrap();
    uninstall::run(&GlobalOpts::default(), &host, &logger("uninstall")).unwrap();
}

#[test]
fn uninstall_task_names() {
    let names: Vec<String> = tasks::all_uninstall_tasks()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    insta::assert_snapshot!(names.join("\n"), @r"
    Remove symlinks
    Remove profile lines
    ");
}

#[cfg(unix)]
#[test]
fn links_become_copies() {
    let sandbox = sandbox();
    run_both(&sandbox, "");

    let vimrc = sandbox.home_path().join(".vimrc");
    assert!(!vimrc.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_to_string(vimrc).unwrap(), "set number\n");

    let git = sandbox.home_path().join(".config/git");
    assert!(!git.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(
        std::fs::read_to_string(git.join("config")).unwrap(),
        "[user]\n\tname = Test\n"
    );
}

#[cfg(unix)]
#[test]
fn profile_returns_to_user_content() {
    let sandbox = sandbox();
    run_both(&sandbox, "# mine\nexport EDITOR=vim\n");

    let profile = std::fs::read_to_string(sandbox.home_path().join(".profile")).unwrap();
    assert_eq!(profile, "# mine\nexport EDITOR=vim\n");
}

#[cfg(unix)]
#[test]
fn lines_the_user_already_had_survive() {
    let sandbox = sandbox();
    let own = "umask 022\nexport PATH=\"$HOME/.local/bin:$PATH\"\n";
    run_both(&sandbox, own);

    let profile = std::fs::read_to_string(sandbox.home_path().join(".profile")).unwrap();
    assert_eq!(profile, own);
}

#[test]
fn uninstall_without_install_is_harmless() {
    let sandbox = sandbox();
    let host = sandbox.host(Arc::new(RecordingExecutor::new()));
    uninstall::run(&GlobalOpts::default(), &host, &logger("uninstall")).unwrap();
    assert!(sandbox.home_path().join(".vimrc").symlink_metadata().is_err());
}
