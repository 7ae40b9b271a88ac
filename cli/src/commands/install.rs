//! Install command implementation.
use std::sync::Arc;

use anyhow::Result;

use super::Host;
use crate::cli::{GlobalOpts, InstallOpts};
use crate::logging::Logger;
use crate::tasks::{self, Task};

/// Whether `name` survives the `--only`/`--skip` filters. Matching is by
/// case-insensitive substring; `--only` wins when both are given.
#[must_use]
pub fn selected(name: &str, opts: &InstallOpts) -> bool {
    let name = name.to_lowercase();
    if !opts.only.is_empty() {
        return opts.only.iter().any(|o| name.contains(&o.to_lowercase()));
    }
    !opts.skip.iter().any(|s| name.contains(&s.to_lowercase()))
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the run is interrupted,
/// or any task fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, host: &Host, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("bootstrap {}", super::version::string()));
    if global.dry_run {
        log.info("dry run: nothing will be changed");
    }

    let ctx = super::prepare(global, host, log)?;

    let all_tasks = tasks::all_install_tasks();
    let tasks_to_run: Vec<&dyn Task> = all_tasks
        .iter()
        .filter(|t| selected(t.name(), opts))
        .map(Box::as_ref)
        .collect();
    log.debug(&format!(
        "{} of {} tasks selected",
        tasks_to_run.len(),
        all_tasks.len()
    ));

    super::run_tasks_to_completion(&tasks_to_run, &ctx, global, log)
}
