//! Generic resource reconciliation: check state, apply or remove, count.
//!
//! - [`apply`] handles one resource at a time
//! - [`parallel`] fans the same work out over Rayon

mod apply;
mod parallel;

use anyhow::Result;

use super::Context;
use crate::resources::{Resource, ResourceState};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotfiles_bootstrap::tasks::TaskResult;
///
/// let skipped = TaskResult::Skipped("gh not installed".into());
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (tool missing, toggle declined, nothing configured).
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for tasks that reconcile many resources.
///
/// # Examples
///
/// ```
/// use dotfiles_bootstrap::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 2, already_ok: 7, skipped: 1 };
/// assert_eq!(stats.summary(false), "2 changed, 7 already ok, 1 skipped");
/// assert_eq!(stats.summary(true), "2 would change, 7 already ok, 1 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Resources changed.
    pub changed: u32,
    /// Resources already in the desired state.
    pub already_ok: u32,
    /// Resources skipped because they could not or should not be changed.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line summary such as `3 changed, 10 already ok`.
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        let mut out = format!("{} {verb}, {} already ok", self.changed, self.already_ok);
        if self.skipped > 0 {
            out.push_str(&format!(", {} skipped", self.skipped));
        }
        out
    }

    /// Log the summary and return the matching [`TaskResult`]. A dry run
    /// that would change nothing is reported as [`TaskResult::Ok`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run && self.changed > 0 {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// How [`ResourceState`] variants are handled by the processing loop.
///
/// # Examples
///
/// ```
/// use dotfiles_bootstrap::tasks::ProcessOpts;
///
/// let links = ProcessOpts::apply_all("link");
/// assert!(links.fix_incorrect && links.fix_missing && links.bail_on_error);
///
/// let packages = ProcessOpts::install_missing("install");
/// assert!(!packages.fix_incorrect && packages.fix_missing && !packages.bail_on_error);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "link", "install", "create").
    pub verb: &'a str,
    /// Apply resources reported `Incorrect`.
    pub fix_incorrect: bool,
    /// Apply resources reported `Missing`.
    pub fix_missing: bool,
    /// Propagate apply failures; otherwise warn and count as skipped.
    pub bail_on_error: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Fix missing and incorrect resources, bailing on errors.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: true,
            fix_missing: true,
            bail_on_error: true,
        }
    }

    /// Fix only missing resources, warning on errors.
    #[must_use]
    pub const fn install_missing(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: false,
            fix_missing: true,
            bail_on_error: false,
        }
    }

    /// Warn on errors instead of bailing.
    #[must_use]
    pub const fn no_bail(mut self) -> Self {
        self.bail_on_error = false;
        self
    }
}

/// Check each resource's state and apply it as needed.
///
/// # Errors
///
/// Returns an error if a state check fails, or an apply fails while
/// `bail_on_error` is set.
pub fn process_resources<R: Resource + Send>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskResult> {
    let resources: Vec<R> = resources.into_iter().collect();
    if ctx.parallel && resources.len() > 1 {
        ctx.log
            .debug(&format!("processing {} resources in parallel", resources.len()));
        return parallel::process_resources_parallel(ctx, resources, opts);
    }
    let mut stats = TaskStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += apply::process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Apply resources whose states were computed up front (e.g. from one
/// installed-package query). Always sequential, so resources are applied in
/// the order given.
///
/// # Errors
///
/// Returns an error if an apply fails while `bail_on_error` is set.
pub fn process_resource_states<R: Resource>(
    ctx: &Context,
    resource_states: impl IntoIterator<Item = (R, ResourceState)>,
    opts: &ProcessOpts,
) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    for (resource, current) in resource_states {
        stats += apply::process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Remove resources that are currently [`ResourceState::Correct`]; anything
/// else is not ours and is left alone.
///
/// # Errors
///
/// Returns an error if a state check or removal fails.
pub fn process_resources_remove<R: Resource + Send>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    verb: &str,
) -> Result<TaskResult> {
    let resources: Vec<R> = resources.into_iter().collect();
    if ctx.parallel && resources.len() > 1 {
        ctx.log
            .debug(&format!("processing {} resources in parallel", resources.len()));
        return parallel::process_remove_parallel(ctx, resources, verb);
    }
    let mut stats = TaskStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += apply::remove_single(ctx, &resource, &current, verb)?;
    }
    Ok(stats.finish(ctx))
}
