//! Directory resource (`create:` directives and XDG base directories).
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A directory that must exist, optionally with exact permission bits.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory path (absolute).
    pub path: PathBuf,
    /// Permission bits to enforce (unix only).
    pub mode: Option<u32>,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(path: PathBuf, mode: Option<u32>) -> Self {
        Self { path, mode }
    }
}

impl Applicable for DirectoryResource {
    fn description(&self) -> String {
        match self.mode {
            Some(mode) => format!("{} (mode {mode:o})", self.path.display()),
            None => self.path.display().to_string(),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("create directory: {}", self.path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = self.mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("set permissions: {}", self.path.display()))?;
        }

        Ok(ResourceChange::Applied)
    }
}

impl Resource for DirectoryResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            if self.path.symlink_metadata().is_ok() {
                return Ok(ResourceState::Invalid {
                    reason: format!("dangling symlink at {}", self.path.display()),
                });
            }
            return Ok(ResourceState::Missing);
        }
        if !self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", self.path.display()),
            });
        }

        #[cfg(unix)]
        if let Some(mode) = self.mode {
            use std::os::unix::fs::PermissionsExt;
            let current = std::fs::metadata(&self.path)
                .with_context(|| format!("stat: {}", self.path.display()))?
                .permissions()
                .mode()
                & 0o7777;
            if current != mode {
                return Ok(ResourceState::Incorrect {
                    current: format!("mode {current:o}"),
                });
            }
        }

        Ok(ResourceState::Correct)
    }
}
