//! Default login shell resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A resource for configuring the default login shell.
#[derive(Debug)]
pub struct DefaultShellResource<'a> {
    /// Target shell name (e.g., "zsh").
    target_shell: String,
    /// Value of `$SHELL` when the run started.
    current_shell: Option<String>,
    /// Registry of permitted login shells.
    shells_file: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> DefaultShellResource<'a> {
    /// Create a new default shell resource.
    #[must_use]
    pub fn new(
        target_shell: String,
        current_shell: Option<String>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            target_shell,
            current_shell,
            shells_file: PathBuf::from("/etc/shells"),
            executor,
        }
    }

    /// Use a different login shell registry (tests).
    #[must_use]
    pub fn with_shells_file(mut self, path: PathBuf) -> Self {
        self.shells_file = path;
        self
    }

    fn is_registered(&self, shell_path: &Path) -> bool {
        std::fs::read_to_string(&self.shells_file)
            .is_ok_and(|s| s.lines().any(|l| Path::new(l.trim()) == shell_path))
    }

    /// Whether applying will append the shell to the login shell registry,
    /// which takes `sudo`.
    #[must_use]
    pub fn needs_registration(&self) -> bool {
        self.current_state().is_ok_and(|s| s != ResourceState::Correct)
            && self
                .executor
                .resolve(&self.target_shell)
                .is_some_and(|path| !self.is_registered(&path))
    }
}

impl Applicable for DefaultShellResource<'_> {
    fn description(&self) -> String {
        format!("default shell → {}", self.target_shell)
    }

    /// Register the shell in `/etc/shells` when needed, then run `chsh`,
    /// which may prompt for the user's password.
    fn apply(&self) -> Result<ResourceChange> {
        let Some(path) = self.executor.resolve(&self.target_shell) else {
            return Ok(ResourceChange::Skipped {
                reason: format!("{} not found", self.target_shell),
            });
        };
        let shell_path = path.display().to_string();

        if !self.is_registered(&path) {
            let script = format!(
                "printf '%s\\n' '{shell_path}' >> '{}'",
                self.shells_file.display()
            );
            self.executor
                .run("sudo", &["sh", "-c", &script])
                .with_context(|| format!("register {shell_path} as a login shell"))?;
        }

        if self
            .executor
            .run_interactive(None, "chsh", &["-s", &shell_path])?
        {
            Ok(ResourceChange::Applied)
        } else {
            anyhow::bail!("chsh -s {shell_path} failed")
        }
    }
}

impl Resource for DefaultShellResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let current_shell = self.current_shell.clone().unwrap_or_default();
        let suffix = format!("/{}", self.target_shell);

        if current_shell.ends_with(&suffix) {
            Ok(ResourceState::Correct)
        } else if current_shell.is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Incorrect {
                current: current_shell,
            })
        }
    }
}
