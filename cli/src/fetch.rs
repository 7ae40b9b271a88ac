//! HTTP download of installer scripts.
use anyhow::{Context as _, Result};

/// Fetches text documents over HTTP(S).
#[cfg_attr(test, mockall::automock)]
pub trait Downloader: Send + Sync + std::fmt::Debug {
    /// Download `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, a non-success status, or a
    /// body that is not valid UTF-8.
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// [`Downloader`] backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {url}");
        let mut response = ureq::get(url)
            .call()
            .with_context(|| format!("download {url}"))?;
        response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("read response body from {url}"))
    }
}
