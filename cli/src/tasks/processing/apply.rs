use anyhow::Result;

use super::{ProcessOpts, TaskStats};
use crate::resources::{Resource, ResourceChange, ResourceState};
use crate::tasks::Context;

/// Reconcile one resource given its current state.
pub(super) fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    resource_state: ResourceState,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource_state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.warn(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Missing if !opts.fix_missing => {
            delta.skipped += 1;
        }
        ResourceState::Incorrect { current } if !opts.fix_incorrect => {
            ctx.log.debug(&format!("leaving {desc} as is ({current})"));
            delta.skipped += 1;
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } if ctx.dry_run => {
            let msg = match resource_state {
                ResourceState::Incorrect { current } => {
                    format!("would {} {desc} (currently {current})", opts.verb)
                }
                _ => format!("would {}: {desc}", opts.verb),
            };
            ctx.log.dry_run(&msg);
            delta.changed += 1;
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } => {
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

/// Apply one resource, mapping the outcome onto counters.
pub(super) fn apply_resource<R: Resource>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource.apply() {
        Ok(ResourceChange::Applied) => {
            ctx.log.debug(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        Ok(ResourceChange::AlreadyCorrect) => {
            delta.already_ok += 1;
        }
        Ok(ResourceChange::Skipped { reason }) => {
            if opts.bail_on_error {
                anyhow::bail!("failed to {} {desc}: {reason}", opts.verb);
            }
            ctx.log.warn(&format!("failed to {} {desc}: {reason}", opts.verb));
            delta.skipped += 1;
        }
        Err(e) => {
            if opts.bail_on_error {
                return Err(e.context(format!("failed to {} {desc}", opts.verb)));
            }
            ctx.log.warn(&format!("failed to {} {desc}: {e:#}", opts.verb));
            delta.skipped += 1;
        }
    }
    Ok(delta)
}

/// Remove one resource if it is currently ours.
pub(super) fn remove_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    current: &ResourceState,
    verb: &str,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    if *current != ResourceState::Correct {
        delta.already_ok += 1;
        return Ok(delta);
    }
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would {verb}: {desc}"));
    } else {
        resource.remove()?;
        ctx.log.debug(&format!("{verb}: {desc}"));
    }
    delta.changed += 1;
    Ok(delta)
}
