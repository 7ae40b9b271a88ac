use std::path::Path;

use anyhow::Result;

use super::{
    Context, ProcessOpts, Task, TaskResult, process_resources, process_resources_remove, task_deps,
};
use crate::resources::profile_line::ProfileLineResource;

/// Lines the profile file must contain, in append order, without repeats.
#[must_use]
pub fn desired_lines(ctx: &Context) -> Vec<String> {
    let profile = &ctx.config.settings.profile;
    let mut lines: Vec<String> = Vec::new();
    if profile.xdg {
        lines.extend(ctx.config.xdg.export_lines().iter().cloned());
    }
    lines.extend(
        profile
            .path
            .iter()
            .map(|entry| format!("export PATH=\"{entry}:$PATH\"")),
    );
    if let Some(line) = brew_shellenv_line(ctx) {
        lines.push(line);
    }
    lines.extend(profile.lines.iter().cloned());

    let mut seen = std::collections::HashSet::new();
    lines.retain(|line| seen.insert(line.trim().to_string()));
    lines
}

/// `eval "$(<brew> shellenv)"` when Homebrew lives in a directory the login
/// `PATH` does not cover.
fn brew_shellenv_line(ctx: &Context) -> Option<String> {
    if !ctx.platform.is_macos() {
        return None;
    }
    let brew = ctx.brew_program()?;
    let dir = Path::new(&brew).parent()?;
    if dir.as_os_str().is_empty() || ctx.path_contains(dir) {
        return None;
    }
    Some(format!("eval \"$({brew} shellenv)\""))
}

fn line_resources(ctx: &Context) -> Vec<ProfileLineResource> {
    desired_lines(ctx)
        .into_iter()
        .map(|line| ProfileLineResource::new(ctx.config.profile_file.clone(), line))
        .collect()
}

/// All lines share one file, so they are never processed in parallel.
fn sequential(ctx: &Context) -> Context {
    Context {
        parallel: false,
        ..ctx.with_log(std::sync::Arc::clone(&ctx.log))
    }
}

/// Append XDG exports, `PATH` entries and extra lines to the shell profile.
#[derive(Debug)]
pub struct ConfigureProfile;

impl Task for ConfigureProfile {
    fn name(&self) -> &str {
        "Configure profile"
    }

    task_deps![super::homebrew::InstallHomebrew];

    fn should_run(&self, ctx: &Context) -> bool {
        !desired_lines(ctx).is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        ctx.log
            .debug(&format!("profile: {}", ctx.config.profile_file.display()));
        process_resources(
            &sequential(ctx),
            line_resources(ctx),
            &ProcessOpts::apply_all("add"),
        )
    }
}

/// Remove the lines [`ConfigureProfile`] added; lines the user wrote stay.
#[derive(Debug)]
pub struct UninstallProfile;

impl Task for UninstallProfile {
    fn name(&self) -> &str {
        "Remove profile lines"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.profile_file.exists()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut managed = Vec::new();
        for resource in line_resources(ctx) {
            if resource.is_managed()? {
                managed.push(resource);
            }
        }
        process_resources_remove(&sequential(ctx), managed, "remove")
    }
}
