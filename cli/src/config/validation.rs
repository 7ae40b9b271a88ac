use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use super::links::{LinkEntry, ShellCommand};
use super::packages::PackageList;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth fixing; the run still proceeds.
    Warning,
    /// The configuration will not apply as written.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A validation finding detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    /// How serious the finding is.
    pub severity: Severity,
    /// The configuration source (e.g., "links", "packages").
    pub source: String,
    /// The specific item that triggered the finding.
    pub item: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a finding.
    #[must_use]
    pub fn new(
        severity: Severity,
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}: {}", self.severity, self.source, self.item, self.message)
    }
}

/// Trait for configuration validators.
pub trait ConfigValidator {
    /// Validate the configuration and return any findings.
    fn validate(&self, root: &Path) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator, used as the finding source.
    fn name(&self) -> &'static str;
}

/// Validator for `link:` entries.
#[derive(Debug)]
pub struct LinkValidator<'a> {
    links: &'a [LinkEntry],
}

impl<'a> LinkValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(links: &'a [LinkEntry]) -> Self {
        Self { links }
    }
}

impl ConfigValidator for LinkValidator<'_> {
    fn validate(&self, root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut first_seen: HashMap<&Path, &str> = HashMap::new();

        for link in self.links {
            if !link.ignore_missing && !link.source.exists() {
                warnings.push(ValidationWarning::new(
                    Severity::Error,
                    self.name(),
                    &link.raw_target,
                    format!("source does not exist: {}", link.source.display()),
                ));
            }

            if !link.source.starts_with(root) {
                warnings.push(ValidationWarning::new(
                    Severity::Warning,
                    self.name(),
                    &link.raw_target,
                    format!("source is outside the dotfiles root: {}", link.source.display()),
                ));
            }

            // Guarded entries may legitimately share a target, one per host.
            if link.condition.is_some() {
                continue;
            }
            if let Some(previous) = first_seen.insert(&link.target, &link.raw_target) {
                warnings.push(ValidationWarning::new(
                    Severity::Error,
                    self.name(),
                    &link.raw_target,
                    format!("target already declared as {previous}"),
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "links"
    }
}

/// Validator for the package list.
#[derive(Debug)]
pub struct PackageValidator<'a> {
    list: &'a PackageList,
}

impl<'a> PackageValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(list: &'a PackageList) -> Self {
        Self { list }
    }
}

impl ConfigValidator for PackageValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        let file = self.list.path.display();
        let duplicates = self.list.duplicates.iter().map(|note| {
            ValidationWarning::new(
                Severity::Warning,
                self.name(),
                &note.name,
                format!("{file}:{}: duplicate entry ignored", note.line),
            )
        });
        let trailing = self.list.trailing.iter().map(|note| {
            ValidationWarning::new(
                Severity::Warning,
                self.name(),
                &note.name,
                format!("{file}:{}: text after the package name is ignored", note.line),
            )
        });
        trailing.chain(duplicates).collect()
    }

    fn name(&self) -> &'static str {
        "packages"
    }
}

/// Validator for `shell:` entries.
#[derive(Debug)]
pub struct ShellValidator<'a> {
    commands: &'a [ShellCommand],
}

impl<'a> ShellValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(commands: &'a [ShellCommand]) -> Self {
        Self { commands }
    }
}

impl ConfigValidator for ShellValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, c)| c.command.trim().is_empty())
            .map(|(idx, c)| {
                ValidationWarning::new(
                    Severity::Error,
                    self.name(),
                    c.description.clone().unwrap_or_else(|| format!("#{}", idx + 1)),
                    "command is empty",
                )
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}

/// Validate all configuration and return collected findings.
#[must_use]
pub fn validate_all(config: &super::Config) -> Vec<ValidationWarning> {
    let validators: Vec<Box<dyn ConfigValidator>> = vec![
        Box::new(LinkValidator::new(&config.links.links)),
        Box::new(PackageValidator::new(&config.packages)),
        Box::new(ShellValidator::new(&config.links.shell)),
    ];

    let mut all_warnings = Vec::new();
    for validator in validators {
        all_warnings.extend(validator.validate(&config.root));
    }

    all_warnings
}

/// Whether any finding is an error.
#[must_use]
pub fn has_errors(findings: &[ValidationWarning]) -> bool {
    findings.iter().any(|w| w.severity == Severity::Error)
}
