//! Package installation resource.
use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;
use crate::exec::Executor;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Homebrew (macOS).
    Brew,
    /// apt (Debian-family Linux).
    Apt,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brew => write!(f, "brew"),
            Self::Apt => write!(f, "apt"),
        }
    }
}

/// Retry policy for a single package install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Total attempts (at least one).
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// A system package resource that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Package name as written in the package list.
    pub name: String,
    /// Package manager to use.
    pub manager: PackageManager,
    /// Program used to invoke the manager (`brew` may live outside `PATH`).
    program: String,
    retry: Retry,
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub fn new(
        name: String,
        manager: PackageManager,
        program: &str,
        retry: Retry,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            manager,
            program: program.to_string(),
            retry,
            executor,
        }
    }

    /// Determine the resource state from a pre-fetched set of installed package names.
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        if installed.contains(installed_name(&self.name)) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }

    fn install_once(&self) -> Result<()> {
        match self.manager {
            PackageManager::Brew => {
                self.executor.run(&self.program, &["install", &self.name])?;
            }
            PackageManager::Apt => {
                self.executor.run(
                    "sudo",
                    &[
                        "DEBIAN_FRONTEND=noninteractive",
                        "apt-get",
                        "install",
                        "-y",
                        &self.name,
                    ],
                )?;
            }
        }
        Ok(())
    }
}

/// Name under which a listed package shows up once installed: taps
/// (`owner/tap/name`) and apt architecture qualifiers (`name:arm64`) are
/// stripped.
fn installed_name(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.split(':').next().unwrap_or(base)
}

/// Query the full set of installed package names for a given manager.
///
/// Runs a single command regardless of how many packages need checking. A
/// failing query yields an empty set, so every package is treated as missing.
///
/// # Errors
///
/// Returns an error if the package manager cannot be spawned.
pub fn get_installed_packages(
    manager: PackageManager,
    program: &str,
    executor: &dyn Executor,
) -> Result<HashSet<String>> {
    let mut set = HashSet::new();
    match manager {
        PackageManager::Brew => {
            // One name per line, formulae and casks alike.
            let result = executor.run_unchecked(program, &["list", "-1"])?;
            if result.success {
                set.extend(
                    result
                        .stdout
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty() && !l.starts_with("==>"))
                        .map(String::from),
                );
            }
        }
        PackageManager::Apt => {
            // "git/jammy,now 1:2.34.1 amd64 [installed]"
            let result = executor.run_unchecked("apt", &["list", "--installed"])?;
            if result.success {
                set.extend(
                    result
                        .stdout
                        .lines()
                        .filter_map(|l| l.split_once('/'))
                        .map(|(name, _)| name.to_string()),
                );
            }
        }
    }
    Ok(set)
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.name, self.manager)
    }

    /// Install with retries. Exhausting every attempt yields
    /// [`ResourceError::PackageInstall`] carrying the last failure.
    fn apply(&self) -> Result<ResourceChange> {
        let attempts = self.retry.attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.install_once() {
                Ok(()) => return Ok(ResourceChange::Applied),
                Err(e) => {
                    tracing::debug!(
                        "{} install attempt {attempt}/{attempts} failed: {e:#}",
                        self.name
                    );
                    last_err = Some(e);
                    if attempt < attempts && !self.retry.delay.is_zero() {
                        std::thread::sleep(self.retry.delay);
                    }
                }
            }
        }
        let source = last_err.map_or_else(
            || Box::<dyn std::error::Error + Send + Sync>::from("no attempt made"),
            Into::into,
        );
        Err(ResourceError::PackageInstall {
            package: self.name.clone(),
            attempts,
            source,
        }
        .into())
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let result = match self.manager {
            PackageManager::Brew => self
                .executor
                .run_unchecked(&self.program, &["list", "--versions", installed_name(&self.name)])?,
            PackageManager::Apt => self
                .executor
                .run_unchecked("dpkg", &["-s", installed_name(&self.name)])?,
        };
        let installed = result.success
            && (self.manager == PackageManager::Brew
                || result.stdout.contains("Status: install ok installed"));
        Ok(if installed {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}
