use anyhow::Result;

use super::{Context, Task, TaskResult, task_deps};

/// Apply the repository's `Brewfile` with `brew bundle`.
#[derive(Debug)]
pub struct InstallBrewBundle;

impl Task for InstallBrewBundle {
    fn name(&self) -> &str {
        "Install Brewfile bundle"
    }

    task_deps![super::homebrew::InstallHomebrew];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_macos() && ctx.config.brewfile.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(brewfile) = ctx.config.brewfile.as_deref() else {
            return Ok(TaskResult::Skipped("no Brewfile".to_string()));
        };
        let Some(brew) = ctx.brew_program() else {
            return Ok(TaskResult::Skipped("brew not found".to_string()));
        };
        let file_arg = format!("--file={}", brewfile.display());

        let check = ctx
            .executor
            .run_unchecked(&brew, &["bundle", "check", "--no-upgrade", &file_arg])?;
        if check.success {
            ctx.log.info("Brewfile dependencies already satisfied");
            return Ok(TaskResult::Ok);
        }

        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run brew bundle install {file_arg}"));
            return Ok(TaskResult::DryRun);
        }

        match ctx
            .executor
            .run(&brew, &["bundle", "install", "--no-upgrade", &file_arg])
        {
            Ok(_) => ctx.log.info("Brewfile applied"),
            Err(e) => ctx.log.warn(&format!("brew bundle install failed: {e:#}")),
        }
        Ok(TaskResult::Ok)
    }
}
