use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats, task_deps};
use crate::config::links::ShellCommand;

/// Run the `shell:` commands from the dotfiles root, in file order.
///
/// A failing command is reported and the remaining commands still run.
#[derive(Debug)]
pub struct RunShellCommands;

impl Task for RunShellCommands {
    fn name(&self) -> &str {
        "Run shell commands"
    }

    task_deps![
        super::symlinks::InstallSymlinks,
        super::packages::InstallPackages
    ];

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.shell.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        for command in &ctx.config.links.shell {
            if ctx.dry_run {
                ctx.log.dry_run(&format!("would run: {}", command.label()));
                stats.changed += 1;
                continue;
            }
            if run_one(ctx, command) {
                stats.changed += 1;
            } else {
                stats.skipped += 1;
            }
        }
        Ok(stats.finish(ctx))
    }
}

/// Run a single command, returning whether it succeeded.
fn run_one(ctx: &Context, command: &ShellCommand) -> bool {
    let announce = format!("running: {}", command.label());
    if command.quiet {
        ctx.log.debug(&announce);
    } else {
        ctx.log.info(&announce);
    }

    match ctx
        .executor
        .run_in(ctx.root(), "sh", &["-c", &command.command])
    {
        Ok(result) => {
            if command.stdout {
                for line in result.stdout.lines() {
                    ctx.log.info(line);
                }
            }
            if command.stderr {
                for line in result.stderr.lines() {
                    ctx.log.info(line);
                }
            }
            true
        }
        Err(e) => {
            ctx.log
                .warn(&format!("command failed: {}: {e:#}", command.label()));
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::resources::test_helpers::RecordingExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    fn command(cmd: &str) -> ShellCommand {
        ShellCommand {
            command: cmd.to_string(),
            description: None,
            stdout: false,
            stderr: false,
            quiet: false,
        }
    }

    fn context(commands: &[&str], exec: Arc<RecordingExecutor>) -> Context {
        let mut config = empty_config();
        config.links.shell = commands.iter().map(|c| command(c)).collect();
        make_context(config, Os::Linux, exec)
    }

    #[test]
    fn runs_in_order_through_sh() {
        let exec = Arc::new(RecordingExecutor::new());
        let ctx = context(&["git submodule update --init", "vim +PlugInstall +qa"], exec.clone());
        assert_eq!(RunShellCommands.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(
            exec.calls(),
            [
                "sh -c git submodule update --init",
                "sh -c vim +PlugInstall +qa"
            ]
        );
    }

    #[test]
    fn failure_does_not_stop_the_rest() {
        let exec = Arc::new(RecordingExecutor::new().respond("sh -c false", false, ""));
        let ctx = context(&["false", "true"], exec.clone());
        assert_eq!(RunShellCommands.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn dry_run_runs_nothing() {
        let exec = Arc::new(RecordingExecutor::new());
        let mut ctx = context(&["touch /tmp/x"], exec.clone());
        ctx.dry_run = true;
        assert_eq!(RunShellCommands.run(&ctx).unwrap(), TaskResult::DryRun);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn label_prefers_description() {
        let mut cmd = command("make -C vim");
        assert_eq!(cmd.label(), "make -C vim");
        cmd.description = Some("Build vim plugins".to_string());
        assert_eq!(cmd.label(), "Build vim plugins");
    }
}
