use anyhow::Result;

use super::{
    Context, ProcessOpts, Task, TaskResult, process_resources, process_resources_remove, task_deps,
};
use crate::config::links::LinkEntry;
use crate::resources::symlink::SymlinkResource;

/// Whether a link's `if` condition holds. Conditions run with `sh -c` in the
/// dotfiles root; a link without one always applies.
fn condition_holds(ctx: &Context, entry: &LinkEntry) -> Result<bool> {
    let Some(condition) = entry.condition.as_deref() else {
        return Ok(true);
    };
    let result = ctx.executor.run_unchecked("sh", &["-c", condition])?;
    if !result.success {
        ctx.log.debug(&format!(
            "condition `{condition}` false, skipping {}",
            entry.raw_target
        ));
    }
    Ok(result.success)
}

/// Link resources whose conditions hold, in file order.
fn link_resources(ctx: &Context) -> Result<Vec<SymlinkResource>> {
    let mut resources = Vec::with_capacity(ctx.config.links.links.len());
    for entry in &ctx.config.links.links {
        if condition_holds(ctx, entry)? {
            resources.push(SymlinkResource::from_entry(entry));
        }
    }
    Ok(resources)
}

/// Create the `link:` symlinks into the home directory.
#[derive(Debug)]
pub struct InstallSymlinks;

impl Task for InstallSymlinks {
    fn name(&self) -> &str {
        "Install symlinks"
    }

    task_deps![
        super::directories::CreateDirectories,
        super::clean::CleanDeadLinks
    ];

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.links.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources = link_resources(ctx)?;
        process_resources(ctx, resources, &ProcessOpts::apply_all("link"))
    }
}

/// Replace installed symlinks with copies of their sources.
#[derive(Debug)]
pub struct UninstallSymlinks;

impl Task for UninstallSymlinks {
    fn name(&self) -> &str {
        "Remove symlinks"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.links.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources = ctx
            .config
            .links
            .links
            .iter()
            .map(SymlinkResource::from_entry);
        process_resources_remove(ctx, resources, "unlink")
    }
}
