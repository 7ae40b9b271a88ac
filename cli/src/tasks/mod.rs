//! Named, dependency-ordered tasks that orchestrate resource changes.
pub mod brew_bundle;
pub mod clean;
mod context;
pub mod directories;
pub mod github;
pub mod graph;
pub mod homebrew;
pub mod packages;
mod processing;
pub mod profile;
pub mod shell;
pub mod shell_commands;
pub mod symlinks;

/// Implement [`Task::dependencies`] from a list of task types.
///
/// ```ignore
/// task_deps![super::homebrew::InstallHomebrew]
/// // expands to:
/// //   fn dependencies(&self) -> &[std::any::TypeId] {
/// //       const DEPS: &[std::any::TypeId] =
/// //           &[std::any::TypeId::of::<super::homebrew::InstallHomebrew>()];
/// //       DEPS
/// //   }
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use context::{Context, RunOptions};
pub use processing::{
    ProcessOpts, TaskResult, TaskStats, process_resource_states, process_resources,
    process_resources_remove,
};

use std::any::TypeId;

use anyhow::Result;

use crate::logging::TaskStatus;

/// A named, executable task.
///
/// The `'static` bound gives each task struct a stable [`TypeId`], which
/// is how dependencies are declared (see [`Task::dependencies`]).
pub trait Task: Send + Sync + 'static {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// The concrete `TypeId` of this task, used as a dependency identifier.
    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Tasks that must run before this one when both are selected.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Whether this task applies to the current platform and configuration.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Whether running this task will invoke `sudo`, so credentials should
    /// be cached up front.
    fn needs_sudo(&self, _ctx: &Context) -> bool {
        false
    }

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot complete: a command it depends on
    /// fails, a file cannot be written, or a resource cannot be applied.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The complete set of tasks run by the install command, in run order.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(homebrew::InstallHomebrew),
        Box::new(packages::InstallPackages),
        Box::new(brew_bundle::InstallBrewBundle),
        Box::new(directories::CreateDirectories),
        Box::new(clean::CleanDeadLinks),
        Box::new(symlinks::InstallSymlinks),
        Box::new(profile::ConfigureProfile),
        Box::new(shell::ConfigureShell),
        Box::new(github::AuthenticateGithub),
        Box::new(shell_commands::RunShellCommands),
    ]
}

/// The complete set of tasks run by the uninstall command.
#[must_use]
pub fn all_uninstall_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(symlinks::UninstallSymlinks),
        Box::new(profile::UninstallProfile),
    ]
}

/// Execute a task, recording the result in the logger.
pub fn execute(task: &dyn Task, ctx: &Context) {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
        }
    }
}
