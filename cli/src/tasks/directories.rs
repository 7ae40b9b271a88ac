use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::resources::directory::DirectoryResource;

/// Create `create:` directories and, when enabled, the XDG base directories.
#[derive(Debug)]
pub struct CreateDirectories;

/// Directories to create, declared entries first, without repeats.
fn directory_resources(ctx: &Context) -> Vec<DirectoryResource> {
    let mut resources: Vec<DirectoryResource> = ctx
        .config
        .links
        .create
        .iter()
        .map(|entry| DirectoryResource::new(entry.path.clone(), entry.mode))
        .collect();
    if ctx.config.settings.profile.xdg {
        for dir in ctx.config.xdg.all() {
            if !resources.iter().any(|r| r.path == dir) {
                resources.push(DirectoryResource::new(dir.to_path_buf(), None));
            }
        }
    }
    resources
}

impl Task for CreateDirectories {
    fn name(&self) -> &str {
        "Create directories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.settings.profile.xdg || !ctx.config.links.create.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        process_resources(ctx, directory_resources(ctx), &ProcessOpts::apply_all("create"))
    }
}
