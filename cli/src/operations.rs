//! Filesystem operation abstractions for dependency injection.
//!
//! The directory scans performed by the clean task go through
//! [`FileSystemOps`] so they can be unit-tested against
//! [`MockFileSystemOps`] instead of a real tree.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem queries used when scanning for dead links.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` resolves (following symlinks) to something.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a real directory (symlinks not followed).
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns the immediate child paths inside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> std::io::Result<PathBuf>;

    /// Resolve `path` to its canonical form, following every symlink.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist.
    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn is_dir(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()).map_err(Into::into))
            .collect::<Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn read_link(&self, path: &Path) -> std::io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        dunce::canonicalize(path)
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// Configure directories, live paths and symlinks with the builder methods.
/// A symlink whose target was not registered with [`with_existing`](Self::with_existing)
/// is dangling.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    existing: Vec<PathBuf>,
    dirs: std::collections::HashMap<PathBuf, Vec<PathBuf>>,
    symlinks: std::collections::HashMap<PathBuf, PathBuf>,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as existing.
    #[must_use]
    pub fn with_existing(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        if !self.existing.contains(&p) {
            self.existing.push(p);
        }
        self
    }

    /// Set the entries returned by [`FileSystemOps::read_dir`] for `dir`.
    #[must_use]
    pub fn with_dir_entries(mut self, dir: impl Into<PathBuf>, entries: Vec<PathBuf>) -> Self {
        let d = dir.into();
        self = self.with_existing(d.clone());
        self.dirs.insert(d, entries);
        self
    }

    /// Register `path` as a symbolic link pointing to `target`.
    #[must_use]
    pub fn with_symlink(mut self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.symlinks.insert(path.into(), target.into());
        self
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        match self.symlinks.get(path) {
            Some(target) => self.existing.iter().any(|p| p == target),
            None => self.existing.iter().any(|p| p == path),
        }
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.symlinks.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.dirs
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mock: no entries configured for {}", path.display()))
    }

    fn read_link(&self, path: &Path) -> std::io::Result<PathBuf> {
        self.symlinks
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::InvalidInput))
    }

    /// Follows one registered symlink hop; other paths are already canonical.
    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        if !self.exists(path) {
            return Err(std::io::Error::from(std::io::ErrorKind::NotFound));
        }
        Ok(self.symlinks.get(path).cloned().unwrap_or_else(|| path.to_path_buf()))
    }
}
