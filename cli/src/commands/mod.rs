pub mod check;
pub mod completions;
pub mod install;
pub mod uninstall;
pub mod version;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::validation::{self, ValidationWarning};
use crate::config::{Config, paths};
use crate::exec::{Executor, SystemExecutor};
use crate::error::TaskError;
use crate::logging::{Log, Logger, TaskStatus};
use crate::platform::Platform;
use crate::privilege::{self, SudoKeepAlive};
use crate::prompt::{AskMode, is_ci};
use crate::tasks::{self, Context, RunOptions, Task, graph};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the Ctrl-C handler. Tasks already running finish; the rest are
/// recorded as skipped.
///
/// # Errors
///
/// Returns an error if a handler is already installed.
pub fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst))
        .context("install Ctrl-C handler")
}

fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Process-level inputs of a command: the platform, how external programs are
/// run, and the environment variables.
#[derive(Debug, Clone)]
pub struct Host {
    /// Platform the command runs on.
    pub platform: Platform,
    /// Runs every external program.
    pub executor: Arc<dyn Executor>,
    /// Environment variables.
    pub vars: HashMap<String, String>,
    /// Path of the running binary, used to locate the root.
    pub exe: Option<PathBuf>,
    /// Working directory, used to locate the root.
    pub cwd: PathBuf,
}

impl Host {
    /// The real machine.
    ///
    /// # Errors
    ///
    /// Returns an error on unsupported platforms or when the working
    /// directory cannot be read.
    pub fn detect() -> Result<Self> {
        Ok(Self {
            platform: Platform::detect()?,
            executor: Arc::new(SystemExecutor),
            vars: std::env::vars().collect(),
            exe: std::env::current_exe().ok(),
            cwd: std::env::current_dir().context("read current directory")?,
        })
    }

    /// Value of an environment variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates root resolution, configuration loading and validation so
/// that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded configuration.
    pub config: Config,
    /// Validation findings, already logged.
    pub findings: Vec<ValidationWarning>,
}

impl CommandSetup {
    /// Resolve the root and home, load all configuration and log findings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or `HOME` cannot be determined, or any
    /// configuration file fails to parse.
    pub fn init(global: &GlobalOpts, host: &Host, log: &dyn Log) -> Result<Self> {
        let env = |name: &str| host.var(name);
        let root = paths::resolve_root(global.root.as_deref(), &env, host.exe.as_deref(), &host.cwd)?;
        let home = host
            .var("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .context("HOME is not set")?;
        log.debug(&format!("root: {}", root.display()));
        log.debug(&format!("platform: {}", host.platform.os));

        log.stage("Loading configuration");
        let config = Config::load(&root, &home, global.config.as_deref(), &host.platform, &env)?;
        log.info(&format!(
            "loaded {} links, {} packages, {} shell commands",
            config.links.links.len(),
            config.packages.names.len(),
            config.links.shell.len()
        ));
        log.debug(&format!("{} create entries", config.links.create.len()));
        log.debug(&format!("{} clean entries", config.links.clean.len()));
        log.debug(&format!("profile: {}", config.profile_file.display()));

        let findings = validation::validate_all(&config);
        if !findings.is_empty() {
            log.warn(&format!(
                "found {} configuration finding(s):",
                findings.len()
            ));
            for finding in &findings {
                log.warn(&format!("  {finding}"));
            }
        }

        Ok(Self { config, findings })
    }

    /// Build the task context for this run.
    #[must_use]
    pub fn context(self, global: &GlobalOpts, host: &Host, log: Arc<dyn Log>) -> Context {
        let ci = is_ci(host.var("CI").as_deref());
        let opts = RunOptions {
            dry_run: global.dry_run,
            parallel: global.parallel,
            ask: AskMode::detect(global.yes, ci),
            ci,
            login_shell: host.var("SHELL"),
            search_path: host.var("PATH"),
        };
        Context::new(
            Arc::new(self.config),
            Arc::new(host.platform.clone()),
            log,
            Arc::clone(&host.executor),
            opts,
        )
    }
}

/// Start the sudo keep-alive when some selected task will need it.
fn keep_alive(tasks: &[&dyn Task], ctx: &Context, global: &GlobalOpts) -> Option<SudoKeepAlive> {
    if ctx.dry_run || global.no_sudo || !ctx.executor.which("sudo") {
        return None;
    }
    if !tasks
        .iter()
        .any(|t| t.should_run(ctx) && t.needs_sudo(ctx))
    {
        return None;
    }
    ctx.log.info("caching sudo credentials");
    match SudoKeepAlive::start(Arc::clone(&ctx.executor)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            ctx.log.warn(&format!("sudo keep-alive not started: {e:#}"));
            None
        }
    }
}

/// Order the tasks, run them, print the summary, and fail if any task failed
/// or the run was interrupted.
///
/// # Errors
///
/// Returns an error on a dependency cycle, an interruption, or when one or
/// more tasks recorded a failure.
pub fn run_tasks_to_completion(
    tasks: &[&dyn Task],
    ctx: &Context,
    global: &GlobalOpts,
    log: &Logger,
) -> Result<()> {
    let ordered = graph::topo_order(tasks)?;

    let guard = keep_alive(&ordered, ctx, global);
    let mut remaining = 0;
    for task in &ordered {
        if interrupted() {
            remaining += 1;
            log.record_task(task.name(), TaskStatus::Skipped, Some("interrupted"));
            continue;
        }
        tasks::execute(*task, ctx);
    }
    drop(guard);

    log.print_summary();

    if remaining > 0 {
        return Err(TaskError::Interrupted { remaining }.into());
    }
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

/// Refuse to run as root, then load configuration and build the context.
///
/// # Errors
///
/// Returns an error when running as root or when setup fails.
pub fn prepare(global: &GlobalOpts, host: &Host, log: &Arc<Logger>) -> Result<Context> {
    privilege::ensure_not_root(host.executor.as_ref())?;
    let setup = CommandSetup::init(global, host, &**log)?;
    Ok(setup.context(global, host, Arc::clone(log) as Arc<dyn Log>))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod test_helpers {
    use super::*;
    use crate::platform::Os;
    use crate::resources::test_helpers::RecordingExecutor;
    use std::path::Path;

    /// Linux host whose home is `home`, started from `root`.
    pub fn host(root: &Path, home: &Path, executor: Arc<RecordingExecutor>) -> Host {
        let vars = HashMap::from([
            ("HOME".to_string(), home.display().to_string()),
            ("SHELL".to_string(), "/bin/bash".to_string()),
            ("PATH".to_string(), "/usr/bin:/bin".to_string()),
        ]);
        Host {
            platform: Platform::new(Os::Linux, true),
            executor,
            vars,
            exe: None,
            cwd: root.to_path_buf(),
        }
    }
}
