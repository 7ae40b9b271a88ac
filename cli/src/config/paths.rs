//! Path expansion and dotfiles root discovery.
use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use super::EnvLookup;

/// Files whose presence marks a directory as a dotfiles root.
pub const ROOT_MARKERS: &[&str] = &["install.conf.yaml", "conf/bootstrap.toml"];

/// Expand `~`, `$VAR` and `${VAR}` in `raw`. Unknown variables are left as-is.
#[must_use]
pub fn expand(raw: &str, home: &Path, env: EnvLookup<'_>) -> String {
    shellexpand::full_with_context_no_errors(raw, || home.to_str(), |var| env(var)).into_owned()
}

/// Expand a link target or directory; relative results are joined onto `home`.
#[must_use]
pub fn resolve_target(raw: &str, home: &Path, env: EnvLookup<'_>) -> PathBuf {
    let expanded = PathBuf::from(expand(raw, home, env));
    if expanded.is_absolute() {
        expanded
    } else {
        home.join(expanded)
    }
}

/// Expand a link source; relative results are joined onto `root`.
#[must_use]
pub fn resolve_source(raw: &str, root: &Path, home: &Path, env: EnvLookup<'_>) -> PathBuf {
    let expanded = PathBuf::from(expand(raw, home, env));
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}

/// Whether `dir` contains one of the [`ROOT_MARKERS`].
#[must_use]
pub fn is_dotfiles_root(dir: &Path) -> bool {
    ROOT_MARKERS.iter().any(|m| dir.join(m).is_file())
}

/// Locate the dotfiles root.
///
/// Order: the `--root` flag, `DOTFILES_ROOT`, the directory the binary was
/// installed into (`<root>/bin/` or `<root>/cli/target/<profile>/`), then the
/// current directory and its ancestors. Explicit choices (flag, env) only need
/// to exist; discovered ones must contain a root marker.
///
/// # Errors
///
/// Returns an error if an explicit root does not exist or no candidate qualifies.
pub fn resolve_root(
    flag: Option<&Path>,
    env: EnvLookup<'_>,
    exe: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf> {
    let explicit = flag
        .map(Path::to_path_buf)
        .or_else(|| env("DOTFILES_ROOT").filter(|v| !v.is_empty()).map(PathBuf::from));
    if let Some(root) = explicit {
        return dunce::canonicalize(&root)
            .with_context(|| format!("dotfiles root does not exist: {}", root.display()));
    }

    let exe_candidates = exe
        .and_then(Path::parent)
        .map(|dir| [dir.parent(), dir.ancestors().nth(3)])
        .into_iter()
        .flatten()
        .flatten();
    let cwd_candidates = cwd.ancestors();

    for candidate in exe_candidates.chain(cwd_candidates) {
        if is_dotfiles_root(candidate) {
            return dunce::canonicalize(candidate)
                .with_context(|| format!("canonicalize {}", candidate.display()));
        }
    }

    bail!(
        "could not locate the dotfiles root (looked for {} from {}); pass --root or set DOTFILES_ROOT",
        ROOT_MARKERS.join(" or "),
        cwd.display()
    )
}
