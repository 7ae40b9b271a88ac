use anyhow::{Context as _, Result};

use super::{Context, ProcessOpts, Task, TaskResult, process_resource_states, task_deps};
use crate::resources::ResourceState;
use crate::resources::package::{PackageManager, PackageResource, Retry, get_installed_packages};

/// Install every package from the platform's package list that is not
/// already installed, in list order.
#[derive(Debug)]
pub struct InstallPackages;

impl InstallPackages {
    /// Manager and the program that invokes it, or why packages cannot be
    /// installed on this machine.
    fn manager(ctx: &Context) -> Result<(PackageManager, String), String> {
        if ctx.platform.is_macos() {
            ctx.brew_program()
                .map(|brew| (PackageManager::Brew, brew))
                .ok_or_else(|| "brew not found".to_string())
        } else if ctx.platform.has_apt {
            Ok((PackageManager::Apt, "apt-get".to_string()))
        } else {
            Err("apt-get not available".to_string())
        }
    }
}

impl Task for InstallPackages {
    fn name(&self) -> &str {
        "Install packages"
    }

    task_deps![super::homebrew::InstallHomebrew];

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.packages.names.is_empty()
    }

    fn needs_sudo(&self, ctx: &Context) -> bool {
        ctx.platform.is_linux() && ctx.platform.has_apt
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let (manager, program) = match Self::manager(ctx) {
            Ok(found) => found,
            Err(reason) => return Ok(TaskResult::Skipped(reason)),
        };

        let names = &ctx.config.packages.names;
        ctx.log.debug(&format!(
            "batch-checking {} packages from {} with a single query",
            names.len(),
            ctx.config.packages.path.display()
        ));
        let installed = get_installed_packages(manager, &program, ctx.executor.as_ref())?;

        let settings = &ctx.config.settings.packages;
        let retry = Retry {
            attempts: settings.retries.max(1),
            delay: settings.retry_delay(),
        };
        let resource_states: Vec<_> = names
            .iter()
            .map(|name| {
                let resource = PackageResource::new(
                    name.clone(),
                    manager,
                    &program,
                    retry,
                    ctx.executor.as_ref(),
                );
                let state = resource.state_from_installed(&installed);
                (resource, state)
            })
            .collect();

        let missing = resource_states
            .iter()
            .filter(|(_, state)| *state != ResourceState::Correct)
            .count();
        if manager == PackageManager::Apt && missing > 0 && !ctx.dry_run {
            ctx.log.info("refreshing apt package index");
            ctx.executor
                .run("sudo", &["apt-get", "update"])
                .context("apt-get update")?;
        }

        process_resource_states(ctx, resource_states, &ProcessOpts::install_missing("install"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platform::Os;
    use crate::resources::test_helpers::RecordingExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    fn config_with(names: &[&str]) -> Config {
        let mut config = empty_config();
        config.packages.names = names.iter().map(ToString::to_string).collect();
        config.settings.packages.retry_delay_secs = 0;
        config
    }

    #[test]
    fn empty_list_does_not_run() {
        let exec = Arc::new(RecordingExecutor::new());
        let ctx = make_context(empty_config(), Os::Linux, exec);
        assert!(!InstallPackages.should_run(&ctx));
    }

    #[test]
    fn installs_missing_in_list_order() {
        let exec = Arc::new(
            RecordingExecutor::new()
                .with_program("brew")
                .respond("brew list -1", true, "git\n"),
        );
        let ctx = make_context(config_with(&["ripgrep", "git", "fd", "jq"]), Os::MacOs, exec.clone());
        assert_eq!(InstallPackages.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(
            exec.calls_starting_with("brew install"),
            ["brew install ripgrep", "brew install fd", "brew install jq"]
        );
    }

    #[test]
    fn apt_updates_once_then_installs() {
        let exec = Arc::new(RecordingExecutor::new());
        let ctx = make_context(config_with(&["git", "zsh"]), Os::Linux, exec.clone());
        InstallPackages.run(&ctx).unwrap();
        let calls = exec.calls_starting_with("sudo");
        assert_eq!(calls[0], "sudo apt-get update");
        assert_eq!(calls.len(), 3);
        assert!(calls[1].ends_with("install -y git"));
        assert!(calls[2].ends_with("install -y zsh"));
    }

    #[test]
    fn nothing_missing_skips_apt_update() {
        let out = "git/jammy,now 1 amd64 [installed]\n";
        let exec = Arc::new(RecordingExecutor::new().respond("apt list --installed", true, out));
        let ctx = make_context(config_with(&["git"]), Os::Linux, exec.clone());
        InstallPackages.run(&ctx).unwrap();
        assert!(exec.calls_starting_with("sudo").is_empty());
    }

    #[test]
    fn failed_install_retries_then_warns() {
        let exec = Arc::new(
            RecordingExecutor::new()
                .with_program("brew")
                .respond("brew install broken", false, ""),
        );
        let ctx = make_context(config_with(&["broken", "git"]), Os::MacOs, exec.clone());
        assert_eq!(InstallPackages.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(exec.calls_starting_with("brew install broken").len(), 3);
        assert_eq!(exec.calls_starting_with("brew install git").len(), 1);
    }

    #[test]
    fn missing_brew_skips() {
        let exec = Arc::new(RecordingExecutor::new());
        let ctx = make_context(config_with(&["git"]), Os::MacOs, exec)
            .with_fs_ops(Arc::new(crate::operations::MockFileSystemOps::new()));
        assert!(matches!(
            InstallPackages.run(&ctx).unwrap(),
            TaskResult::Skipped(_)
        ));
    }

    #[test]
    fn dry_run_installs_nothing() {
        let exec = Arc::new(RecordingExecutor::new());
        let mut ctx = make_context(config_with(&["git"]), Os::Linux, exec.clone());
        ctx.dry_run = true;
        assert_eq!(InstallPackages.run(&ctx).unwrap(), TaskResult::DryRun);
        assert_eq!(exec.calls(), ["apt list --installed"]);
    }
}
