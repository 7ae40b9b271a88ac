//! Tool settings loaded from `conf/bootstrap.toml`.
//!
//! Every key is optional; a missing file yields [`Settings::default`].
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::EnvLookup;
use crate::error::ConfigError;

/// Environment variable overriding `shell.change`.
pub const CHANGE_SHELL_ENV: &str = "BOOTSTRAP_CHANGE_SHELL";
/// Environment variable overriding `github.auth`.
pub const GITHUB_AUTH_ENV: &str = "BOOTSTRAP_GITHUB_AUTH";

/// Tri-state feature toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawToggle")]
pub enum Toggle {
    /// Prompt interactively (declines when no terminal is attached).
    #[default]
    Ask,
    /// Always perform the step.
    Yes,
    /// Never perform the step.
    No,
}

impl Toggle {
    /// Parse a toggle value (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidToggle`] for anything other than
    /// `ask`, `yes`/`y`/`true`/`1` or `no`/`n`/`false`/`0`.
    pub fn parse(name: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "yes" | "y" | "true" | "1" => Ok(Self::Yes),
            "no" | "n" | "false" | "0" => Ok(Self::No),
            _ => Err(ConfigError::InvalidToggle {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Toggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ask => write!(f, "ask"),
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// TOML accepts toggles as strings or booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawToggle {
    Bool(bool),
    Text(String),
}

impl TryFrom<RawToggle> for Toggle {
    type Error = ConfigError;

    fn try_from(raw: RawToggle) -> Result<Self, Self::Error> {
        match raw {
            RawToggle::Bool(true) => Ok(Self::Yes),
            RawToggle::Bool(false) => Ok(Self::No),
            RawToggle::Text(s) => Self::parse("toggle", &s),
        }
    }
}

/// `[links]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSettings {
    /// Dotbot-format link configuration, relative to the root.
    pub config: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            config: "install.conf.yaml".to_string(),
        }
    }
}

/// `[packages]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Homebrew package list (macOS).
    pub brew: String,
    /// apt package list (Linux).
    pub apt: String,
    /// Brewfile applied with `brew bundle` (macOS).
    pub brewfile: String,
    /// Attempts per package install.
    pub retries: u32,
    /// Seconds to wait between attempts.
    pub retry_delay_secs: u64,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            brew: "packages/brew.txt".to_string(),
            apt: "packages/apt.txt".to_string(),
            brewfile: "Brewfile".to_string(),
            retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl PackageSettings {
    /// Pause between install attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// `[shell]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Desired default login shell.
    pub login: String,
    /// Whether to change the login shell.
    pub change: Toggle,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            login: "zsh".to_string(),
            change: Toggle::Ask,
        }
    }
}

/// `[github]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSettings {
    /// Whether to run `gh auth login`.
    pub auth: Toggle,
}

/// `[profile]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileSettings {
    /// Profile file; derived from the login shell when unset.
    pub file: Option<String>,
    /// Export XDG base directories and create them.
    pub xdg: bool,
    /// Entries prepended to `PATH`.
    pub path: Vec<String>,
    /// Extra lines written verbatim.
    pub lines: Vec<String>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            file: None,
            xdg: true,
            path: vec!["$HOME/.local/bin".to_string()],
            lines: Vec::new(),
        }
    }
}

/// Parsed `conf/bootstrap.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[links]`.
    pub links: LinkSettings,
    /// `[packages]`.
    pub packages: PackageSettings,
    /// `[shell]`.
    pub shell: ShellSettings,
    /// `[github]`.
    pub github: GithubSettings,
    /// `[profile]`.
    pub profile: ProfileSettings,
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
    /// [`ConfigError::InvalidSyntax`] if it is not valid settings TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse settings from TOML text; `file` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] on malformed TOML or unknown keys.
    pub fn parse(content: &str, file: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
            file: file.to_string(),
            message: e.message().to_string(),
        })
    }

    /// Apply `BOOTSTRAP_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidToggle`] if an override holds an
    /// unrecognised value.
    pub fn apply_env(&mut self, env: EnvLookup<'_>) -> Result<(), ConfigError> {
        if let Some(v) = env(CHANGE_SHELL_ENV).filter(|v| !v.is_empty()) {
            self.shell.change = Toggle::parse(CHANGE_SHELL_ENV, &v)?;
        }
        if let Some(v) = env(GITHUB_AUTH_ENV).filter(|v| !v.is_empty()) {
            self.github.auth = Toggle::parse(GITHUB_AUTH_ENV, &v)?;
        }
        Ok(())
    }

    /// Profile file as configured (unexpanded), defaulting by login shell.
    #[must_use]
    pub fn profile_file(&self) -> String {
        if let Some(file) = &self.profile.file {
            return file.clone();
        }
        match self.shell.login.rsplit('/').next().unwrap_or_default() {
            "zsh" => "~/.zprofile",
            "bash" => "~/.bash_profile",
            _ => "~/.profile",
        }
        .to_string()
    }
}
