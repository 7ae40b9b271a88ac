use anyhow::Result;

use super::{Context, Task, TaskResult, task_deps};
use crate::config::settings::Toggle;
use crate::prompt::resolve_toggle;

/// Log the GitHub CLI in to github.com.
#[derive(Debug)]
pub struct AuthenticateGithub;

impl Task for AuthenticateGithub {
    fn name(&self) -> &str {
        "Authenticate GitHub CLI"
    }

    task_deps![super::packages::InstallPackages];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.settings.github.auth != Toggle::No
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.executor.which("gh") {
            return Ok(TaskResult::Skipped("gh not installed".to_string()));
        }

        let status = ctx.executor.run_unchecked("gh", &["auth", "status"])?;
        if status.success {
            ctx.log.info("already authenticated");
            return Ok(TaskResult::Ok);
        }

        if ctx.dry_run {
            ctx.log.dry_run("would run gh auth login");
            return Ok(TaskResult::DryRun);
        }
        if ctx.ci {
            return Ok(TaskResult::Skipped("CI environment".to_string()));
        }
        if !resolve_toggle(
            ctx.config.settings.github.auth,
            "Log in to GitHub with the gh CLI?",
            ctx.ask,
            ctx.prompter.as_ref(),
        )? {
            return Ok(TaskResult::Skipped("declined".to_string()));
        }

        if ctx.executor.run_interactive(None, "gh", &["auth", "login"])? {
            Ok(TaskResult::Ok)
        } else {
            anyhow::bail!("gh auth login failed")
        }
    }
}
