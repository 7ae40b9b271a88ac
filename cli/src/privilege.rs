//! Root guard and sudo credential keep-alive.
use anyhow::{Context as _, Result, bail};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::PlatformError;
use crate::exec::Executor;

/// How often cached sudo credentials are refreshed.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Refuse to run as root: links and profile edits would land in root's home.
///
/// # Errors
///
/// Returns [`PlatformError::RunningAsRoot`] when the effective user is root.
pub fn ensure_not_root(executor: &dyn Executor) -> Result<()> {
    let result = executor.run_unchecked("id", &["-u"])?;
    if result.success && result.stdout.trim() == "0" {
        return Err(PlatformError::RunningAsRoot.into());
    }
    Ok(())
}

/// Keeps sudo credentials cached while alive.
///
/// Dropping the guard stops the refresh thread.
#[derive(Debug)]
pub struct SudoKeepAlive {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SudoKeepAlive {
    /// Prompt for the sudo password once (`sudo -v`), then refresh the
    /// credential cache every [`KEEP_ALIVE_INTERVAL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the initial authentication fails.
    pub fn start(executor: Arc<dyn Executor>) -> Result<Self> {
        Self::start_with_interval(executor, KEEP_ALIVE_INTERVAL)
    }

    /// [`Self::start`] with a custom refresh interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial authentication fails.
    pub fn start_with_interval(executor: Arc<dyn Executor>, interval: Duration) -> Result<Self> {
        if !executor
            .run_interactive(None, "sudo", &["-v"])
            .context("run sudo -v")?
        {
            bail!("sudo authentication failed");
        }

        let (stop, rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("sudo-keep-alive".to_string())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(e) = executor.run_unchecked("sudo", &["-n", "true"]) {
                                tracing::debug!("sudo keep-alive refresh failed: {e:#}");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .context("spawn sudo keep-alive thread")?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }
}

impl Drop for SudoKeepAlive {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::debug!("sudo keep-alive thread panicked");
        }
    }
}
