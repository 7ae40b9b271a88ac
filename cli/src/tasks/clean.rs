use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources};
use crate::config::links::CleanEntry;
use crate::resources::stale_link::StaleLinkResource;

/// Remove dead symlinks from `clean:` directories.
#[derive(Debug)]
pub struct CleanDeadLinks;

impl Task for CleanDeadLinks {
    fn name(&self) -> &str {
        "Clean dead links"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.links.clean.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut dead = Vec::new();
        for entry in &ctx.config.links.clean {
            dead.extend(find_dead_links(ctx, entry));
        }
        ctx.log
            .debug(&format!("{} dead link(s) found", dead.len()));
        process_resources(ctx, dead, &ProcessOpts::apply_all("remove").no_bail())
    }
}

/// Dangling links under `entry.path` that this repository owns: the link
/// points into the dotfiles root, or `force` is set.
fn find_dead_links(ctx: &Context, entry: &CleanEntry) -> Vec<StaleLinkResource> {
    let mut found = Vec::new();
    let mut pending = vec![entry.path.clone()];
    while let Some(dir) = pending.pop() {
        let children = match ctx.fs_ops.read_dir(&dir) {
            Ok(children) => children,
            Err(e) => {
                ctx.log
                    .debug(&format!("cannot scan {}: {e:#}", dir.display()));
                continue;
            }
        };
        for child in children {
            if ctx.fs_ops.is_symlink(&child) {
                if ctx.fs_ops.exists(&child) {
                    continue;
                }
                let Ok(points_to) = ctx.fs_ops.read_link(&child) else {
                    continue;
                };
                let points_to = absolute_link_target(&child, &points_to);
                if entry.force || points_into_root(ctx, &points_to) {
                    found.push(StaleLinkResource::new(child, points_to));
                } else {
                    ctx.log.debug(&format!(
                        "leaving {} (points outside {})",
                        child.display(),
                        ctx.root().display()
                    ));
                }
            } else if entry.recursive && ctx.fs_ops.is_dir(&child) {
                pending.push(child);
            }
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

/// Whether a dead link's target lies in the dotfiles root, either as written
/// or once its longest existing ancestor is canonicalised (the link may have
/// been made through an alias of the root).
fn points_into_root(ctx: &Context, target: &Path) -> bool {
    if target.starts_with(ctx.root()) {
        return true;
    }
    target
        .ancestors()
        .find_map(|ancestor| {
            let canonical = ctx.fs_ops.canonicalize(ancestor).ok()?;
            let rest = target.strip_prefix(ancestor).ok()?;
            Some(canonical.join(rest))
        })
        .is_some_and(|resolved| resolved.starts_with(ctx.root()))
}

/// Resolve a link's stored target against the directory holding the link,
/// folding `.` and `..` lexically (the target no longer exists).
fn absolute_link_target(link: &Path, target: &Path) -> PathBuf {
    let joined = match link.parent() {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::MockFileSystemOps;
    use crate::platform::Os;
    use crate::resources::test_helpers::RecordingExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    fn entry(path: &str, force: bool, recursive: bool) -> CleanEntry {
        CleanEntry {
            path: PathBuf::from(path),
            force,
            recursive,
        }
    }

    fn context(fs: MockFileSystemOps) -> Context {
        make_context(empty_config(), Os::Linux, Arc::new(RecordingExecutor::new()))
            .with_fs_ops(Arc::new(fs))
    }

    fn paths(found: &[StaleLinkResource]) -> Vec<PathBuf> {
        found.iter().map(|r| r.path.clone()).collect()
    }

    fn home_fixture() -> MockFileSystemOps {
        MockFileSystemOps::new()
            .with_existing("/tmp/dotfiles/vimrc")
            .with_dir_entries(
                "/home/test",
                vec![
                    PathBuf::from("/home/test/.vimrc"),
                    PathBuf::from("/home/test/.oldrc"),
                    PathBuf::from("/home/test/.foreign"),
                    PathBuf::from("/home/test/.config"),
                ],
            )
            .with_dir_entries(
                "/home/test/.config",
                vec![PathBuf::from("/home/test/.config/nested")],
            )
            .with_symlink("/home/test/.vimrc", "/tmp/dotfiles/vimrc")
            .with_symlink("/home/test/.oldrc", "/tmp/dotfiles/oldrc")
            .with_symlink("/home/test/.foreign", "/opt/elsewhere/rc")
            .with_symlink("/home/test/.config/nested", "../../../tmp/dotfiles/gone")
    }

    #[test]
    fn links_made_through_an_alias_of_the_root_are_found() {
        let fs = MockFileSystemOps::new()
            .with_existing("/tmp/dotfiles")
            .with_symlink("/home/test/.dotfiles", "/tmp/dotfiles")
            .with_dir_entries(
                "/home/test",
                vec![
                    PathBuf::from("/home/test/.aliased"),
                    PathBuf::from("/home/test/.foreign"),
                ],
            )
            .with_symlink("/home/test/.aliased", "/home/test/.dotfiles/gone")
            .with_symlink("/home/test/.foreign", "/opt/elsewhere/rc");
        let ctx = context(fs);
        let found = find_dead_links(&ctx, &entry("/home/test", false, false));
        assert_eq!(paths(&found), [PathBuf::from("/home/test/.aliased")]);
    }

    #[test]
    fn only_dead_links_into_root_are_found() {
        let ctx = context(home_fixture());
        let found = find_dead_links(&ctx, &entry("/home/test", false, false));
        assert_eq!(paths(&found), [PathBuf::from("/home/test/.oldrc")]);
    }

    #[test]
    fn force_takes_foreign_links_too() {
        let ctx = context(home_fixture());
        let found = find_dead_links(&ctx, &entry("/home/test", true, false));
        assert_eq!(
            paths(&found),
            [
                PathBuf::from("/home/test/.foreign"),
                PathBuf::from("/home/test/.oldrc")
            ]
        );
    }

    #[test]
    fn recursive_descends_into_directories() {
        let ctx = context(home_fixture());
        let found = find_dead_links(&ctx, &entry("/home/test", false, true));
        assert_eq!(
            paths(&found),
            [
                PathBuf::from("/home/test/.config/nested"),
                PathBuf::from("/home/test/.oldrc")
            ]
        );
    }

    #[test]
    fn missing_directory_finds_nothing() {
        let ctx = context(MockFileSystemOps::new());
        assert!(find_dead_links(&ctx, &entry("/home/test/none", true, true)).is_empty());
    }

    #[test]
    fn relative_targets_resolve_from_link_dir() {
        assert_eq!(
            absolute_link_target(Path::new("/h/.config/x"), Path::new("../y")),
            PathBuf::from("/h/y")
        );
        assert_eq!(
            absolute_link_target(Path::new("/h/x"), Path::new("/abs/./z")),
            PathBuf::from("/abs/z")
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_removes_dead_links_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let dead = home.path().join(".oldrc");
        std::os::unix::fs::symlink(root.path().join("oldrc"), &dead).unwrap();

        let mut config = crate::config::test_helpers::empty_config(root.path(), home.path());
        config.links.clean.push(CleanEntry {
            path: home.path().to_path_buf(),
            force: false,
            recursive: false,
        });
        let ctx = make_context(config, Os::Linux, Arc::new(RecordingExecutor::new()));
        assert_eq!(CleanDeadLinks.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(dead.symlink_metadata().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn run_removes_dead_links_through_a_root_alias() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let alias = home.path().join(".dotfiles");
        std::os::unix::fs::symlink(root.path(), &alias).unwrap();
        let dead = home.path().join(".oldrc");
        std::os::unix::fs::symlink(alias.join("oldrc"), &dead).unwrap();

        let canonical_root = dunce::canonicalize(root.path()).unwrap();
        let mut config = crate::config::test_helpers::empty_config(&canonical_root, home.path());
        config.links.clean.push(CleanEntry {
            path: home.path().to_path_buf(),
            force: false,
            recursive: false,
        });
        let ctx = make_context(config, Os::Linux, Arc::new(RecordingExecutor::new()));
        assert_eq!(CleanDeadLinks.run(&ctx).unwrap(), TaskResult::Ok);
        assert!(dead.symlink_metadata().is_err());
        assert!(alias.symlink_metadata().is_ok());
    }
}
