use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::error::ResourceError;

/// Official Homebrew installer.
pub const INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Install Homebrew on macOS when it is not already present.
#[derive(Debug)]
pub struct InstallHomebrew;

impl Task for InstallHomebrew {
    fn name(&self) -> &str {
        "Install Homebrew"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_macos()
    }

    fn needs_sudo(&self, ctx: &Context) -> bool {
        ctx.brew_program().is_none()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if let Some(brew) = ctx.brew_program() {
            ctx.log.debug(&format!("found {brew}"));
            return Ok(TaskResult::Skipped("already installed".to_string()));
        }

        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run the installer from {INSTALL_SCRIPT_URL}"));
            return Ok(TaskResult::DryRun);
        }

        install(ctx)
    }
}

/// Download and run the installer, then confirm `brew` can be found.
fn install(ctx: &Context) -> Result<TaskResult> {
    ctx.log.info("downloading installer");
    let script = ctx
        .downloader
        .fetch_text(INSTALL_SCRIPT_URL)
        .context("download Homebrew installer")?;

    ctx.log.info("running installer");
    ctx.executor
        .run_with_env("/bin/bash", &["-c", &script], &[("NONINTERACTIVE", "1")])
        .context("Homebrew installer")?;

    let brew = ctx
        .brew_program()
        .ok_or_else(|| ResourceError::NotFound("brew after install".to_string()))?;
    ctx.log.info(&format!("installed {brew}"));
    Ok(TaskResult::Ok)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::MockDownloader;
    use crate::operations::MockFileSystemOps;
    use crate::platform::Os;
    use crate::resources::test_helpers::RecordingExecutor;
    use crate::tasks::test_helpers::{empty_config, make_context};
    use std::sync::Arc;

    #[test]
    fn only_runs_on_macos() {
        let exec = Arc::new(RecordingExecutor::new());
        let linux = make_context(empty_config(), Os::Linux, exec.clone());
        let mac = make_context(empty_config(), Os::MacOs, exec);
        assert!(!InstallHomebrew.should_run(&linux));
        assert!(InstallHomebrew.should_run(&mac));
    }

    #[test]
    fn skips_when_brew_present() {
        let exec = Arc::new(RecordingExecutor::new().with_program("brew"));
        let ctx = make_context(empty_config(), Os::MacOs, exec.clone());
        assert!(!InstallHomebrew.needs_sudo(&ctx));
        let result = InstallHomebrew.run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::Skipped(_)));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn downloads_and_runs_installer() {
        let exec = Arc::new(RecordingExecutor::new());
        let mut downloader = MockDownloader::new();
        downloader
            .expect_fetch_text()
            .withf(|url| url == INSTALL_SCRIPT_URL)
            .times(1)
            .returning(|_| Ok("echo installing".to_string()));
        // Installed brew appears at the Apple Silicon prefix.
        let fs = MockFileSystemOps::new().with_existing("/opt/homebrew/bin/brew");
        let ctx = make_context(empty_config(), Os::MacOs, exec.clone())
            .with_downloader(Arc::new(downloader))
            .with_fs_ops(Arc::new(fs));

        assert_eq!(install(&ctx).unwrap(), TaskResult::Ok);
        assert_eq!(exec.calls(), ["/bin/bash -c echo installing"]);
    }

    #[test]
    fn dry_run_downloads_nothing() {
        let exec = Arc::new(RecordingExecutor::new());
        let mut downloader = MockDownloader::new();
        downloader.expect_fetch_text().never();
        let mut ctx = make_context(empty_config(), Os::MacOs, exec.clone())
            .with_downloader(Arc::new(downloader))
            .with_fs_ops(Arc::new(MockFileSystemOps::new()));
        ctx.dry_run = true;
        assert_eq!(InstallHomebrew.run(&ctx).unwrap(), TaskResult::DryRun);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn missing_brew_after_install_fails() {
        let exec = Arc::new(RecordingExecutor::new());
        let mut downloader = MockDownloader::new();
        downloader
            .expect_fetch_text()
            .returning(|_| Ok("true".to_string()));
        let ctx = make_context(empty_config(), Os::MacOs, exec)
            .with_downloader(Arc::new(downloader))
            .with_fs_ops(Arc::new(MockFileSystemOps::new()));
        let err = InstallHomebrew.run(&ctx).unwrap_err();
        assert!(err.to_string().contains("brew after install"));
    }
}
