//! Operating-system detection and the top-level macOS/Linux dispatch.
use std::fmt;
use std::path::Path;

use crate::error::PlatformError;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Apple macOS (Homebrew).
    MacOs,
    /// Linux (apt when available).
    Linux,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// Well-known Homebrew locations checked when `brew` is not yet on `PATH`
/// (for example immediately after a fresh install in the same run).
pub const BREW_CANDIDATES: &[&str] = &[
    "/opt/homebrew/bin/brew",
    "/usr/local/bin/brew",
    "/home/linuxbrew/.linuxbrew/bin/brew",
];

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Whether the Debian-family `apt-get` package manager is available.
    pub has_apt: bool,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] on anything other than macOS or
    /// Linux.
    pub fn detect() -> Result<Self, PlatformError> {
        let os = Self::detect_os(std::env::consts::OS)?;
        let has_apt = os == Os::Linux
            && (Path::new("/etc/debian_version").exists() || which::which("apt-get").is_ok());
        Ok(Self { os, has_apt })
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, has_apt: bool) -> Self {
        Self { os, has_apt }
    }

    /// Whether this is macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    /// Whether this is Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    /// Map an `std::env::consts::OS` identifier onto a supported [`Os`].
    fn detect_os(id: &str) -> Result<Os, PlatformError> {
        match id {
            "macos" => Ok(Os::MacOs),
            "linux" => Ok(Os::Linux),
            other => Err(PlatformError::Unsupported {
                platform: other.to_string(),
            }),
        }
    }
}
