//! Symlink resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::{
    copy_dir_recursive, ensure_parent_dir, normalize, relative_path, remove_existing,
    resolve_link_target,
};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::links::LinkEntry;
use crate::error::ResourceError;

/// How an existing target is treated and how the link is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkBehavior {
    /// Replace a symlink that points somewhere else.
    pub relink: bool,
    /// Replace anything at the target, including real files and directories.
    pub force: bool,
    /// Store the link relative to the target's directory.
    pub relative: bool,
    /// Link even when the source does not exist yet.
    pub ignore_missing: bool,
}

/// A symlink resource that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
    /// Replacement and link-format options.
    pub behavior: LinkBehavior,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, behavior: LinkBehavior) -> Self {
        Self {
            source,
            target,
            behavior,
        }
    }

    /// Build a resource from a `link:` entry.
    #[must_use]
    pub fn from_entry(entry: &LinkEntry) -> Self {
        Self::new(
            entry.source.clone(),
            entry.target.clone(),
            LinkBehavior {
                relink: entry.relink,
                force: entry.force,
                relative: entry.relative,
                ignore_missing: entry.ignore_missing,
            },
        )
    }

    /// Path stored inside the link.
    fn link_value(&self) -> PathBuf {
        if self.behavior.relative
            && let Some(parent) = self.target.parent()
        {
            return relative_path(&normalize(parent), &normalize(&self.source));
        }
        self.source.clone()
    }

    fn points_to_source(&self, stored: &Path) -> bool {
        let resolved = resolve_link_target(&self.target, stored);
        if resolved == normalize(&self.source) {
            return true;
        }
        match (dunce::canonicalize(&resolved), dunce::canonicalize(&self.source)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.target)?;

        if let Ok(meta) = self.target.symlink_metadata() {
            let replaceable = if meta.is_symlink() {
                self.behavior.relink || self.behavior.force
            } else {
                self.behavior.force
            };
            if !replaceable {
                return Ok(ResourceChange::Skipped {
                    reason: format!("{} already exists", self.target.display()),
                });
            }
            remove_existing(&self.target)?;
        }

        create_symlink(&self.link_value(), &self.target)?;
        Ok(ResourceChange::Applied)
    }

    /// Replace the link with a copy of its source so the user keeps the
    /// content after uninstall.
    fn remove(&self) -> Result<ResourceChange> {
        if !self.source.exists() {
            remove_existing(&self.target)?;
            return Ok(ResourceChange::Applied);
        }
        copy_into_place(&self.source, &self.target).with_context(|| {
            format!(
                "materialize {} -> {}",
                self.target.display(),
                self.source.display()
            )
        })?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.behavior.ignore_missing && !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        let Ok(meta) = self.target.symlink_metadata() else {
            return Ok(ResourceState::Missing);
        };

        if meta.is_symlink() {
            let stored = std::fs::read_link(&self.target)
                .with_context(|| format!("read link: {}", self.target.display()))?;
            if self.points_to_source(&stored) {
                return Ok(ResourceState::Correct);
            }
            if self.behavior.relink || self.behavior.force {
                return Ok(ResourceState::Incorrect {
                    current: format!("points to {}", stored.display()),
                });
            }
            return Ok(ResourceState::Invalid {
                reason: format!(
                    "target links to {} (set relink to replace)",
                    stored.display()
                ),
            });
        }

        let kind = if meta.is_dir() { "directory" } else { "file" };
        if self.behavior.force {
            Ok(ResourceState::Incorrect {
                current: format!("target is a real {kind}"),
            })
        } else {
            Ok(ResourceState::Invalid {
                reason: format!("target is a real {kind} (set force to replace)"),
            })
        }
    }
}

/// Copy `source` into `target`, replacing the symlink that currently lives
/// there. Content is staged at a sibling path and renamed into place.
fn copy_into_place(source: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let staged = parent.join(target.file_name().map_or_else(
        || ".bootstrap_tmp".to_string(),
        |n| format!(".{}.bootstrap_tmp", n.to_string_lossy()),
    ));

    let staged_result = if source.is_dir() {
        copy_dir_recursive(source, &staged)
    } else {
        std::fs::copy(source, &staged)
            .map(|_| ())
            .with_context(|| format!("copy {} to {}", source.display(), staged.display()))
    };
    if let Err(e) = staged_result {
        remove_existing(&staged).ok();
        return Err(e);
    }

    if let Err(e) = std::fs::remove_file(target) {
        remove_existing(&staged).ok();
        return Err(e).with_context(|| format!("remove symlink: {}", target.display()));
    }
    std::fs::rename(&staged, target)
        .with_context(|| format!("rename {} to {}", staged.display(), target.display()))
}

/// Create a symlink at `link` storing `value`.
fn create_symlink(value: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(value, link).map_err(|e| {
            ResourceError::Symlink(format!(
                "{} -> {}: {e}",
                link.display(),
                value.display()
            ))
            .into()
        })
    }
    #[cfg(not(unix))]
    {
        Err(ResourceError::Symlink(format!(
            "symlinks are not supported on this platform: {} -> {}",
            link.display(),
            value.display()
        ))
        .into())
    }
}
