//! Shell profile line resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// First line of the block holding the lines this tool wrote.
pub const BLOCK_START: &str = "# >>> dotfiles-bootstrap >>>";
/// Last line of that block.
pub const BLOCK_END: &str = "# <<< dotfiles-bootstrap <<<";

/// A line that must be present in a shell profile file.
///
/// A line counts as present when any line of the file equals it after
/// trimming surrounding whitespace, so hand-indented copies are respected.
/// Missing lines are written inside a marked block at the end of the file,
/// and only lines inside that block are ever removed.
#[derive(Debug, Clone)]
pub struct ProfileLineResource {
    /// Profile file (e.g. `~/.zprofile`).
    pub file: PathBuf,
    /// Exact line content, without trailing newline.
    pub line: String,
}

impl ProfileLineResource {
    /// Create a new profile line resource.
    #[must_use]
    pub const fn new(file: PathBuf, line: String) -> Self {
        Self { file, line }
    }

    /// Whether the line sits inside the managed block, i.e. uninstall may
    /// take it out again.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile exists but cannot be read.
    pub fn is_managed(&self) -> Result<bool> {
        let contents = read_or_empty(&self.file)?;
        let lines: Vec<&str> = contents.lines().collect();
        Ok(managed_position(&lines, &self.line).is_some())
    }
}

fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("read profile: {}", path.display())),
    }
}

fn contains_line(contents: &str, line: &str) -> bool {
    let wanted = line.trim();
    contents.lines().any(|l| l.trim() == wanted)
}

/// Indices of the start and end markers of the managed block.
fn block_bounds(lines: &[&str]) -> Option<(usize, usize)> {
    let start = lines.iter().position(|l| l.trim() == BLOCK_START)?;
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, l)| l.trim() == BLOCK_END)
        .map(|(i, _)| i)?;
    Some((start, end))
}

/// Index of `line` inside the managed block.
fn managed_position(lines: &[&str], line: &str) -> Option<usize> {
    let (start, end) = block_bounds(lines)?;
    let wanted = line.trim();
    lines
        .iter()
        .enumerate()
        .take(end)
        .skip(start + 1)
        .find(|(_, l)| l.trim() == wanted)
        .map(|(i, _)| i)
}

fn write_lines(path: &Path, lines: &[&str]) -> Result<()> {
    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    std::fs::write(path, contents).with_context(|| format!("write profile: {}", path.display()))
}

impl Applicable for ProfileLineResource {
    fn description(&self) -> String {
        format!("{}: {}", self.file.display(), self.line)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let contents = read_or_empty(&self.file)?;
        if contains_line(&contents, &self.line) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        let mut lines: Vec<&str> = contents.lines().collect();
        match block_bounds(&lines) {
            Some((_, end)) => lines.insert(end, self.line.as_str()),
            None => lines.extend([BLOCK_START, self.line.as_str(), BLOCK_END]),
        }
        ensure_parent_dir(&self.file)?;
        write_lines(&self.file, &lines)?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        let contents = read_or_empty(&self.file)?;
        let mut lines: Vec<&str> = contents.lines().collect();
        let Some(index) = managed_position(&lines, &self.line) else {
            return Ok(ResourceChange::AlreadyCorrect);
        };
        lines.remove(index);
        if let Some((start, end)) = block_bounds(&lines)
            && end == start + 1
        {
            lines.remove(end);
            lines.remove(start);
        }
        write_lines(&self.file, &lines)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ProfileLineResource {
    fn current_state(&self) -> Result<ResourceState> {
        let contents = read_or_empty(&self.file)?;
        Ok(if contains_line(&contents, &self.line) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const PATH_LINE: &str = r#"export PATH="$HOME/.local/bin:$PATH""#;

    #[test]
    fn creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/.zprofile");
        let r = ProfileLineResource::new(file.clone(), PATH_LINE.to_string());
        assert_eq!(r.current_state().unwrap(), ResourceState::Missing);
        r.apply().unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            format!("{BLOCK_START}\n{PATH_LINE}\n{BLOCK_END}\n")
        );
    }

    #[test]
    fn appending_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".zprofile");
        std::fs::write(&file, "# mine\n").unwrap();
        let r = ProfileLineResource::new(file.clone(), PATH_LINE.to_string());
        r.apply().unwrap();
        let first = std::fs::read(&file).unwrap();
        assert_eq!(r.apply().unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(std::fs::read(&file).unwrap(), first);
    }

    #[test]
    fn later_lines_join_the_existing_block() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".profile");
        std::fs::write(&file, "umask 022").unwrap();
        ProfileLineResource::new(file.clone(), "export A=1".to_string())
            .apply()
            .unwrap();
        std::fs::write(
            &file,
            format!("{}alias ll='ls -l'\n", std::fs::read_to_string(&file).unwrap()),
        )
        .unwrap();
        ProfileLineResource::new(file.clone(), "export B=2".to_string())
            .apply()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            format!("umask 022\n{BLOCK_START}\nexport A=1\nexport B=2\n{BLOCK_END}\nalias ll='ls -l'\n")
        );
    }

    #[test]
    fn indented_copy_counts_as_present() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".zprofile");
        std::fs::write(&file, format!("  {PATH_LINE}  \n")).unwrap();
        let r = ProfileLineResource::new(file, PATH_LINE.to_string());
        assert_eq!(r.current_state().unwrap(), ResourceState::Correct);
        assert!(!r.is_managed().unwrap());
    }

    #[test]
    fn remove_takes_out_the_block_and_keeps_other_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".zprofile");
        std::fs::write(&file, "# mine\n").unwrap();
        let r = ProfileLineResource::new(file.clone(), PATH_LINE.to_string());
        r.apply().unwrap();
        std::fs::write(
            &file,
            format!("{}alias ll='ls -l'\n", std::fs::read_to_string(&file).unwrap()),
        )
        .unwrap();
        assert!(r.is_managed().unwrap());

        r.remove().unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "# mine\nalias ll='ls -l'\n"
        );
        assert_eq!(r.remove().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn remove_leaves_lines_the_user_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".zprofile");
        std::fs::write(&file, format!("{PATH_LINE}\n")).unwrap();
        let r = ProfileLineResource::new(file.clone(), PATH_LINE.to_string());
        assert_eq!(r.apply().unwrap(), ResourceChange::AlreadyCorrect);

        assert_eq!(r.remove().unwrap(), ResourceChange::AlreadyCorrect);
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            format!("{PATH_LINE}\n")
        );
    }
}
