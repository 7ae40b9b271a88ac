use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resource_states, task_deps};
use crate::config::settings::Toggle;
use crate::prompt::resolve_toggle;
use crate::resources::shell::DefaultShellResource;
use crate::resources::{Resource, ResourceState};

fn resource(ctx: &Context) -> DefaultShellResource<'_> {
    DefaultShellResource::new(
        ctx.config.settings.shell.login.clone(),
        ctx.login_shell.clone(),
        ctx.executor.as_ref(),
    )
}

/// Make the configured shell the user's login shell.
#[derive(Debug)]
pub struct ConfigureShell;

impl Task for ConfigureShell {
    fn name(&self) -> &str {
        "Configure default shell"
    }

    task_deps![super::packages::InstallPackages];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.settings.shell.change != Toggle::No
    }

    fn needs_sudo(&self, ctx: &Context) -> bool {
        !ctx.ci && resource(ctx).needs_registration()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.ci {
            return Ok(TaskResult::Skipped("CI environment".to_string()));
        }
        let shell = &ctx.config.settings.shell.login;
        if !ctx.executor.which(shell) {
            return Ok(TaskResult::Skipped(format!("{shell} not installed")));
        }

        let resource = resource(ctx);
        let state = resource.current_state()?;
        if state == ResourceState::Correct {
            ctx.log.info(&format!("login shell is already {shell}"));
            return Ok(TaskResult::Ok);
        }

        if !ctx.dry_run {
            let question = format!("Change your login shell to {shell}?");
            if !resolve_toggle(
                ctx.config.settings.shell.change,
                &question,
                ctx.ask,
                ctx.prompter.as_ref(),
            )? {
                return Ok(TaskResult::Skipped("declined".to_string()));
            }
        }

        process_resource_states(ctx, [(resource, state)], &ProcessOpts::apply_all("change"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::prompt::{AskMode, MockPrompter};
    use crate::resources::test_helpers::RecordingExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    fn context(toggle: Toggle, exec: Arc<RecordingExecutor>) -> Context {
        let mut config = empty_config();
        config.settings.shell.change = toggle;
        let mut ctx = make_context(config, Os::Linux, exec);
        ctx.login_shell = Some("/bin/bash".to_string());
        ctx
    }

    fn zsh_executor() -> Arc<RecordingExecutor> {
        Arc::new(
            RecordingExecutor::new()
                .with_program_at("zsh", "/bin/zsh"),
        )
    }

    #[test]
    fn disabled_toggle_does_not_run() {
        let ctx = context(Toggle::No, zsh_executor());
        assert!(!ConfigureShell.should_run(&ctx));
    }

    #[test]
    fn yes_changes_shell() {
        let exec = zsh_executor();
        let ctx = context(Toggle::Yes, exec.clone());
        assert_eq!(ConfigureShell.run(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(exec.calls_starting_with("chsh"), ["chsh -s /bin/zsh"]);
    }

    #[test]
    fn already_correct_never_asks() {
        let exec = zsh_executor();
        let mut ctx = context(Toggle::Ask, exec.clone())
            .with_prompter(Arc::new(MockPrompter::new()));
        ctx.ask = AskMode::Interactive;
        ctx.login_shell = Some("/usr/bin/zsh".to_string());
        assert_eq!(ConfigureShell.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn declined_prompt_skips() {
        let exec = zsh_executor();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_, _| Ok(false));
        let mut ctx = context(Toggle::Ask, exec.clone()).with_prompter(Arc::new(prompter));
        ctx.ask = AskMode::Interactive;
        assert_eq!(
            ConfigureShell.run(&ctx).unwrap(),
            TaskResult::Skipped("declined".to_string())
        );
        assert!(exec.calls_starting_with("chsh").is_empty());
    }

    #[test]
    fn ci_and_missing_shell_skip() {
        let mut ctx = context(Toggle::Yes, zsh_executor());
        ctx.ci = true;
        assert!(matches!(ConfigureShell.run(&ctx).unwrap(), TaskResult::Skipped(_)));

        let ctx = context(Toggle::Yes, Arc::new(RecordingExecutor::new()));
        assert_eq!(
            ConfigureShell.run(&ctx).unwrap(),
            TaskResult::Skipped("zsh not installed".to_string())
        );
    }

    #[test]
    fn unregistered_shell_needs_sudo() {
        let exec = Arc::new(
            RecordingExecutor::new().with_program_at("zsh", "/nonexistent/dotfiles-test/zsh"),
        );
        let mut ctx = context(Toggle::Yes, exec);
        assert!(ConfigureShell.needs_sudo(&ctx));

        ctx.login_shell = Some("/nonexistent/dotfiles-test/zsh".to_string());
        assert!(!ConfigureShell.needs_sudo(&ctx));

        ctx.login_shell = Some("/bin/bash".to_string());
        ctx.ci = true;
        assert!(!ConfigureShell.needs_sudo(&ctx));
    }
}
