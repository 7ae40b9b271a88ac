//! Dotbot-format link configuration (`install.conf.yaml`).
//!
//! The file is a YAML sequence of directives. Each item is a mapping whose
//! keys name a directive (`defaults`, `link`, `create`, `clean`, `shell`);
//! directives keep their file order within each kind. A `defaults` directive
//! applies to every directive after it until the next `defaults`.
//!
//! Link options that only matter to Dotbot itself (`create`, `glob`,
//! `canonicalize`, ...) are accepted and ignored: parent directories of link
//! targets are always created.
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use super::EnvLookup;
use super::paths::{resolve_source, resolve_target};
use crate::error::ConfigError;

/// A symlink to create: `target` (in `$HOME`) → `source` (in the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Absolute link location.
    pub target: PathBuf,
    /// Absolute path the link points to.
    pub source: PathBuf,
    /// Target exactly as written, for messages and duplicate detection.
    pub raw_target: String,
    /// Replace an existing symlink pointing elsewhere.
    pub relink: bool,
    /// Replace whatever exists at the target.
    pub force: bool,
    /// Store a relative link instead of an absolute one.
    pub relative: bool,
    /// Link even when the source does not exist.
    pub ignore_missing: bool,
    /// Shell condition (`if:`); the link is skipped when it exits non-zero.
    pub condition: Option<String>,
}

/// A directory to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEntry {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Unix permission bits, if requested.
    pub mode: Option<u32>,
}

/// A directory to scan for dead links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Remove every dead link, not only those pointing into the root.
    pub force: bool,
    /// Descend into subdirectories.
    pub recursive: bool,
}

/// A command from a `shell:` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// Command line passed to `sh -c`.
    pub command: String,
    /// Human-readable label shown instead of the command.
    pub description: Option<String>,
    /// Show the command's standard output.
    pub stdout: bool,
    /// Show the command's standard error.
    pub stderr: bool,
    /// Do not announce the command before running it.
    pub quiet: bool,
}

impl ShellCommand {
    /// Label used in log output.
    #[must_use]
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.command)
    }
}

/// Everything declared in the link configuration.
#[derive(Debug, Clone, Default)]
pub struct LinkConfig {
    /// `link:` entries.
    pub links: Vec<LinkEntry>,
    /// `create:` entries.
    pub create: Vec<CreateEntry>,
    /// `clean:` entries.
    pub clean: Vec<CleanEntry>,
    /// `shell:` entries.
    pub shell: Vec<ShellCommand>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawLinkOptions {
    path: Option<String>,
    relink: Option<bool>,
    force: Option<bool>,
    relative: Option<bool>,
    ignore_missing: Option<bool>,
    #[serde(rename = "if")]
    condition: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawShellOptions {
    stdout: Option<bool>,
    stderr: Option<bool>,
    quiet: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ModeValue {
    Number(u64),
    Text(String),
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawCreateOptions {
    mode: Option<ModeValue>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawCleanOptions {
    force: Option<bool>,
    recursive: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct Defaults {
    link: RawLinkOptions,
    shell: RawShellOptions,
    create: RawCreateOptions,
    clean: RawCleanOptions,
}

#[derive(Debug, Deserialize)]
struct RawShellCommand {
    command: String,
    description: Option<String>,
    stdout: Option<bool>,
    stderr: Option<bool>,
    quiet: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawShellEntry {
    Line(String),
    List(Vec<String>),
    Full(RawShellCommand),
}

/// Parse an octal permission mode such as `700`, `"0755"` or `"0o700"`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidMode`] unless the value is one to four octal
/// digits.
pub fn parse_mode(raw: &str) -> Result<u32, ConfigError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let valid = (1..=4).contains(&digits.len()) && digits.bytes().all(|b| (b'0'..=b'7').contains(&b));
    if !valid {
        return Err(ConfigError::InvalidMode(raw.to_string()));
    }
    u32::from_str_radix(digits, 8).map_err(|_| ConfigError::InvalidMode(raw.to_string()))
}

fn mode_of(value: &ModeValue) -> Result<u32, ConfigError> {
    match value {
        ModeValue::Number(n) => parse_mode(&n.to_string()),
        ModeValue::Text(s) => parse_mode(s),
    }
}

/// Source used when a link omits one: the target's file name with a single
/// leading `.` stripped (`~/.zshrc` → `zshrc`).
fn implicit_source(raw_target: &str) -> String {
    let name = Path::new(raw_target.trim_end_matches('/'))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_prefix('.').map_or_else(|| name.clone(), str::to_string)
}

fn invalid(directive: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidDirective {
        directive: directive.to_string(),
        message: message.into(),
    }
}

fn from_value<T: DeserializeOwned>(directive: &str, value: Value) -> Result<T, ConfigError> {
    serde_yaml::from_value(value).map_err(|e| invalid(directive, e.to_string()))
}

fn key_str<'v>(directive: &str, key: &'v Value) -> Result<&'v str, ConfigError> {
    key.as_str()
        .ok_or_else(|| invalid(directive, format!("expected a path, found {key:?}")))
}

/// Directive body as a list of `(path, options)` pairs. Accepts a sequence of
/// paths or a mapping of path → options (options may be null).
fn path_items(directive: &str, body: Value) -> Result<Vec<(String, Value)>, ConfigError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok((s, Value::Null)),
                other => Err(invalid(directive, format!("expected a path, found {other:?}"))),
            })
            .collect(),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(k, v)| Ok((key_str(directive, &k)?.to_string(), v)))
            .collect(),
        other => Err(invalid(
            directive,
            format!("expected a list or mapping, found {other:?}"),
        )),
    }
}

/// Resolution context shared by every directive.
struct Resolver<'a> {
    root: &'a Path,
    home: &'a Path,
    env: EnvLookup<'a>,
}

impl Resolver<'_> {
    fn target(&self, raw: &str) -> PathBuf {
        let trimmed = if raw.len() > 1 {
            raw.trim_end_matches('/')
        } else {
            raw
        };
        resolve_target(trimmed, self.home, self.env)
    }

    fn link(&self, defaults: &Defaults, raw_target: String, value: Value) -> Result<LinkEntry, ConfigError> {
        let opts = match value {
            Value::Null => RawLinkOptions::default(),
            Value::String(path) => RawLinkOptions {
                path: Some(path),
                ..RawLinkOptions::default()
            },
            Value::Mapping(_) => from_value("link", value)?,
            other => {
                return Err(invalid(
                    "link",
                    format!("{raw_target}: expected a path or options, found {other:?}"),
                ));
            }
        };
        let d = &defaults.link;
        let raw_source = opts.path.unwrap_or_else(|| implicit_source(&raw_target));
        Ok(LinkEntry {
            target: self.target(&raw_target),
            source: resolve_source(&raw_source, self.root, self.home, self.env),
            relink: opts.relink.or(d.relink).unwrap_or(false),
            force: opts.force.or(d.force).unwrap_or(false),
            relative: opts.relative.or(d.relative).unwrap_or(false),
            ignore_missing: opts.ignore_missing.or(d.ignore_missing).unwrap_or(false),
            condition: opts.condition.or_else(|| d.condition.clone()),
            raw_target,
        })
    }

    fn create(&self, defaults: &Defaults, raw: &str, value: Value) -> Result<CreateEntry, ConfigError> {
        let opts: RawCreateOptions = match value {
            Value::Null => RawCreateOptions::default(),
            other => from_value("create", other)?,
        };
        let mode = opts
            .mode
            .as_ref()
            .or(defaults.create.mode.as_ref())
            .map(mode_of)
            .transpose()?;
        Ok(CreateEntry {
            path: self.target(raw),
            mode,
        })
    }

    fn clean(&self, defaults: &Defaults, raw: &str, value: Value) -> Result<CleanEntry, ConfigError> {
        let opts: RawCleanOptions = match value {
            Value::Null => RawCleanOptions::default(),
            other => from_value("clean", other)?,
        };
        Ok(CleanEntry {
            path: self.target(raw),
            force: opts.force.or(defaults.clean.force).unwrap_or(false),
            recursive: opts.recursive.or(defaults.clean.recursive).unwrap_or(false),
        })
    }
}

fn shell_command(defaults: &Defaults, entry: RawShellEntry) -> Result<ShellCommand, ConfigError> {
    let d = &defaults.shell;
    let (command, description, stdout, stderr, quiet) = match entry {
        RawShellEntry::Line(command) => (command, None, None, None, None),
        RawShellEntry::List(parts) => {
            let mut parts = parts.into_iter();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(command), description, None) => (command, description, None, None, None),
                _ => {
                    return Err(invalid(
                        "shell",
                        "list entries take the form [command] or [command, description]",
                    ));
                }
            }
        }
        RawShellEntry::Full(raw) => (raw.command, raw.description, raw.stdout, raw.stderr, raw.quiet),
    };
    Ok(ShellCommand {
        command,
        description,
        stdout: stdout.or(d.stdout).unwrap_or(false),
        stderr: stderr.or(d.stderr).unwrap_or(false),
        quiet: quiet.or(d.quiet).unwrap_or(false),
    })
}

impl LinkConfig {
    /// Load from `path`; a missing file yields an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path, root: &Path, home: &Path, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
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
        Self::parse(&content, &path.display().to_string(), root, home, env)
    }

    /// Parse configuration text; `file` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] for malformed YAML,
    /// [`ConfigError::UnknownDirective`] for unrecognised directive names and
    /// [`ConfigError::InvalidDirective`] for ill-formed directive bodies.
    pub fn parse(
        content: &str,
        file: &str,
        root: &Path,
        home: &Path,
        env: EnvLookup<'_>,
    ) -> Result<Self, ConfigError> {
        let blank = content
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#'));
        if blank {
            return Ok(Self::default());
        }
        let document: Option<Vec<Mapping>> =
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
                file: file.to_string(),
                message: e.to_string(),
            })?;

        let resolver = Resolver { root, home, env };
        let mut config = Self::default();
        let mut defaults = Defaults::default();

        for item in document.unwrap_or_default() {
            for (key, body) in item {
                let directive = key
                    .as_str()
                    .ok_or_else(|| ConfigError::UnknownDirective(format!("{key:?}")))?;
                match directive {
                    "defaults" => {
                        defaults = match body {
                            Value::Null => Defaults::default(),
                            other => from_value("defaults", other)?,
                        };
                    }
                    "link" => {
                        for (target, value) in path_items("link", body)? {
                            config.links.push(resolver.link(&defaults, target, value)?);
                        }
                    }
                    "create" => {
                        for (path, value) in path_items("create", body)? {
                            config.create.push(resolver.create(&defaults, &path, value)?);
                        }
                    }
                    "clean" => {
                        for (path, value) in path_items("clean", body)? {
                            config.clean.push(resolver.clean(&defaults, &path, value)?);
                        }
                    }
                    "shell" => {
                        let entries: Vec<RawShellEntry> = match body {
                            Value::Null => Vec::new(),
                            other => from_value("shell", other)?,
                        };
                        for entry in entries {
                            config.shell.push(shell_command(&defaults, entry)?);
                        }
                    }
                    other => return Err(ConfigError::UnknownDirective(other.to_string())),
                }
            }
        }

        Ok(config)
    }
}
