use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::exec::Executor;
use crate::fetch::{Downloader, HttpDownloader};
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::{BREW_CANDIDATES, Platform};
use crate::prompt::{AskMode, DialoguerPrompter, Prompter};

/// Per-run switches and the environment values tasks consult.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Preview changes without applying them.
    pub dry_run: bool,
    /// Check and apply independent filesystem resources with Rayon.
    pub parallel: bool,
    /// How `ask` toggles are answered.
    pub ask: AskMode,
    /// Running under CI (`CI` set).
    pub ci: bool,
    /// `$SHELL` when the run started.
    pub login_shell: Option<String>,
    /// `$PATH` when the run started.
    pub search_path: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            parallel: false,
            ask: AskMode::Decline,
            ci: false,
            login_shell: None,
            search_path: None,
        }
    }
}

/// Shared context for task execution.
pub struct Context {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Whether to process resources in parallel using Rayon.
    pub parallel: bool,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Interactive confirmation.
    pub prompter: Arc<dyn Prompter>,
    /// HTTP client for installer scripts.
    pub downloader: Arc<dyn Downloader>,
    /// How `ask` toggles are answered.
    pub ask: AskMode,
    /// Running under CI.
    pub ci: bool,
    /// `$SHELL` when the run started.
    pub login_shell: Option<String>,
    /// `$PATH` when the run started.
    pub search_path: Option<String>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.config.root)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("executor", &self.executor)
            .field("parallel", &self.parallel)
            .field("ask", &self.ask)
            .field("ci", &self.ci)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context with the system filesystem, the terminal
    /// prompter and the HTTP downloader.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        opts: RunOptions,
    ) -> Self {
        Self {
            home: config.home.clone(),
            config,
            platform,
            log,
            dry_run: opts.dry_run,
            executor,
            parallel: opts.parallel,
            fs_ops: Arc::new(SystemFileSystemOps),
            prompter: Arc::new(DialoguerPrompter),
            downloader: Arc::new(HttpDownloader),
            ask: opts.ask,
            ci: opts.ci,
            login_shell: opts.login_shell,
            search_path: opts.search_path,
        }
    }

    /// Root directory of the dotfiles repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Program to invoke Homebrew with: `brew` when it is on `PATH`,
    /// otherwise the first well-known install location that exists.
    #[must_use]
    pub fn brew_program(&self) -> Option<String> {
        if self.executor.which("brew") {
            return Some("brew".to_string());
        }
        BREW_CANDIDATES
            .iter()
            .find(|c| self.fs_ops.exists(Path::new(c)))
            .map(|c| (*c).to_string())
    }

    /// Whether `dir` is listed in the `$PATH` captured at startup.
    #[must_use]
    pub fn path_contains(&self, dir: &Path) -> bool {
        self.search_path
            .as_deref()
            .is_some_and(|p| std::env::split_paths(p).any(|entry| entry == dir))
    }

    /// Create a copy of this context with a different logger.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            log,
            ..self.shallow_clone()
        }
    }

    /// Replace the filesystem abstraction.
    #[must_use]
    pub fn with_fs_ops(self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        Self { fs_ops, ..self }
    }

    /// Replace the prompter.
    #[must_use]
    pub fn with_prompter(self, prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter, ..self }
    }

    /// Replace the downloader.
    #[must_use]
    pub fn with_downloader(self, downloader: Arc<dyn Downloader>) -> Self {
        Self { downloader, ..self }
    }

    fn shallow_clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            platform: Arc::clone(&self.platform),
            log: Arc::clone(&self.log),
            dry_run: self.dry_run,
            home: self.home.clone(),
            executor: Arc::clone(&self.executor),
            parallel: self.parallel,
            fs_ops: Arc::clone(&self.fs_ops),
            prompter: Arc::clone(&self.prompter),
            downloader: Arc::clone(&self.downloader),
            ask: self.ask,
            ci: self.ci,
            login_shell: self.login_shell.clone(),
            search_path: self.search_path.clone(),
        }
    }
}
