//! Dead symlink resource (`clean:` directives).
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A dangling symlink found during a clean scan; applying removes it.
///
/// The scan decides which links qualify; this resource only re-checks that
/// the link is still dangling before removing it.
#[derive(Debug, Clone)]
pub struct StaleLinkResource {
    /// Path of the symlink.
    pub path: PathBuf,
    /// Target stored in the link at scan time.
    pub points_to: PathBuf,
}

impl StaleLinkResource {
    /// Create a new stale link resource.
    #[must_use]
    pub const fn new(path: PathBuf, points_to: PathBuf) -> Self {
        Self { path, points_to }
    }
}

impl Applicable for StaleLinkResource {
    fn description(&self) -> String {
        format!(
            "{} (dead link to {})",
            self.path.display(),
            self.points_to.display()
        )
    }

    fn apply(&self) -> Result<ResourceChange> {
        std::fs::remove_file(&self.path)
            .with_context(|| format!("remove dead link: {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for StaleLinkResource {
    /// `Incorrect` while the dangling link is present, `Correct` once it is
    /// gone or its target has reappeared.
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_symlink() && !self.path.exists() {
            Ok(ResourceState::Incorrect {
                current: format!("dangling link to {}", self.points_to.display()),
            })
        } else {
            Ok(ResourceState::Correct)
        }
    }
}
