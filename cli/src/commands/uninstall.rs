//! Uninstall command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::Host;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::tasks::{self, Task};

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the run is interrupted,
/// or any task fails.
pub fn run(global: &GlobalOpts, host: &Host, log: &Arc<Logger>) -> Result<()> {
    let ctx = super::prepare(global, host, log)?;
    let tasks = tasks::all_uninstall_tasks();
    let tasks: Vec<&dyn Task> = tasks.iter().map(Box::as_ref).collect();
    super::run_tasks_to_completion(&tasks, &ctx, global, log)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::host;
    use crate::resources::test_helpers::RecordingExecutor;

    #[test]
    fn uninstall_tasks_contain_remove_symlinks() {
        let tasks = tasks::all_uninstall_tasks();
        let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        assert!(
            names.contains(&"Remove symlinks"),
            "expected 'Remove symlinks' in {names:?}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn replaces_links_with_copies() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("install.conf.yaml"), "- link:\n    ~/.vimrc:\n").unwrap();
        std::fs::write(root.path().join("vimrc"), "set number\n").unwrap();
        let link = home.path().join(".vimrc");
        std::os::unix::fs::symlink(root.path().join("vimrc"), &link).unwrap();

        let host = host(root.path(), home.path(), Arc::new(RecordingExecutor::new()));
        run(&GlobalOpts::default(), &host, &Arc::new(Logger::new("uninstall"))).unwrap();

        assert!(!link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "set number\n");
    }
}
