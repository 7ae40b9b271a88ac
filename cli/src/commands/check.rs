//! Check command: validate configuration and report drift without changing
//! anything.
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{CommandSetup, Host};
use crate::cli::{CheckOpts, GlobalOpts};
use crate::config::validation::{self, ValidationWarning};
use crate::logging::{Log, Logger, TaskEntry, TaskStatus};
use crate::tasks::{self, Task, graph};

/// Everything `check` found.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Tool version.
    pub version: &'static str,
    /// Configuration findings.
    pub findings: Vec<ValidationWarning>,
    /// Outcome of every install task run in dry-run mode.
    pub tasks: Vec<TaskEntry>,
    /// Whether any task would change the machine.
    pub drift: bool,
}

impl CheckReport {
    /// Whether the run should exit non-zero.
    #[must_use]
    pub fn failed(&self) -> bool {
        validation::has_errors(&self.findings)
            || self.tasks.iter().any(|t| t.status == TaskStatus::Failed)
    }
}

/// Load the configuration and dry-run every install task.
///
/// # Errors
///
/// Returns an error if configuration loading fails or the tasks form a cycle.
pub fn report(global: &GlobalOpts, host: &Host, log: &Arc<Logger>) -> Result<CheckReport> {
    let global = GlobalOpts {
        dry_run: true,
        ..global.clone()
    };
    let setup = CommandSetup::init(&global, host, &**log)?;
    let findings = setup.findings.clone();
    let ctx = setup.context(&global, host, Arc::clone(log) as Arc<dyn Log>);

    let all_tasks = tasks::all_install_tasks();
    let refs: Vec<&dyn Task> = all_tasks.iter().map(Box::as_ref).collect();
    for task in graph::topo_order(&refs)? {
        tasks::execute(task, &ctx);
    }

    let entries = log.task_entries();
    let drift = entries.iter().any(|t| t.status == TaskStatus::DryRun);
    Ok(CheckReport {
        version: super::version::string(),
        findings,
        tasks: entries,
        drift,
    })
}

/// Run the check command.
///
/// # Errors
///
/// Returns an error when configuration loading fails, validation found
/// errors, or a task failed while checking.
pub fn run(global: &GlobalOpts, opts: &CheckOpts, host: &Host, log: &Arc<Logger>) -> Result<()> {
    let report = report(global, host, log)?;
    log.print_summary();

    if opts.json {
        let json = serde_json::to_string_pretty(&report).context("serialize check report")?;
        println!("{json}");
    } else if report.drift {
        log.info("the machine differs from the configuration; run install to apply");
    } else {
        log.info("the machine matches the configuration");
    }

    if validation::has_errors(&report.findings) {
        let errors = report
            .findings
            .iter()
            .filter(|f| f.severity == validation::Severity::Error)
            .count();
        anyhow::bail!("configuration has {errors} error(s)");
    }
    if report.failed() {
        anyhow::bail!("{} task(s) failed", log.failure_count());
    }
    Ok(())
}
