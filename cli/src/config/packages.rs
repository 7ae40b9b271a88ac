//! Flat package lists (`packages/brew.txt`, `packages/apt.txt`).
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// A line that was accepted with something worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNote {
    /// 1-based line number.
    pub line: usize,
    /// Package name on that line.
    pub name: String,
}

/// Parsed package list.
#[derive(Debug, Clone, Default)]
pub struct PackageList {
    /// File the list was read from.
    pub path: PathBuf,
    /// Distinct package names in file order.
    pub names: Vec<String>,
    /// Repeated names that were dropped.
    pub duplicates: Vec<ListNote>,
    /// Lines carrying tokens after the package name.
    pub trailing: Vec<ListNote>,
}

impl PackageList {
    /// Load a list from `path`; a missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content, path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self {
                path: path.to_path_buf(),
                ..Self::default()
            }),
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Parse list text. `#` starts a comment anywhere on a line.
    #[must_use]
    pub fn parse(content: &str, path: &Path) -> Self {
        let mut list = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };
        let mut seen = HashSet::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default();
            let mut tokens = line.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            let note = ListNote {
                line: idx + 1,
                name: name.to_string(),
            };
            if tokens.next().is_some() {
                list.trailing.push(note.clone());
            }
            if seen.insert(name.to_string()) {
                list.names.push(name.to_string());
            } else {
                list.duplicates.push(note);
            }
        }

        list
    }
}
