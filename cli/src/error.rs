//! Domain-specific error types for the bootstrap engine.
//!
//! Internal modules return typed errors (e.g. [`ConfigError`], [`PlatformError`])
//! where a caller may want to match on the failure, and [`anyhow::Error`]
//! elsewhere. Command handlers at the CLI boundary convert everything to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! BootstrapError
//! ├── Config(ConfigError)     : TOML/YAML parsing, toggles, package lists
//! ├── Task(TaskError)         : task ordering and interruption
//! ├── Resource(ResourceError) : symlinks, package installs
//! └── Platform(PlatformError) : fatal environment mismatches
//! ```

use thiserror::Error;

/// Top-level error type for the bootstrap engine.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task ordering or execution error.
    #[error("Task execution error: {0}")]
    Task(#[from] TaskError),

    /// Resource operation error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Fatal environment mismatch.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A feature toggle holds a value other than ask/yes/no.
    #[error("Invalid value '{value}' for {name}: expected ask, yes or no")]
    InvalidToggle {
        /// Setting or environment variable name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// The link configuration names a directive this tool does not know.
    #[error("Unknown directive '{0}' (expected defaults, link, create, clean or shell)")]
    UnknownDirective(String),

    /// A directive is present but its value has the wrong shape.
    #[error("Invalid '{directive}' directive: {message}")]
    InvalidDirective {
        /// Directive name (`link`, `create`, ...).
        directive: String,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A directory mode is not a valid octal permission string.
    #[error("Invalid mode '{0}': expected octal digits such as 700 or 0755")]
    InvalidMode(String),

    /// The file contains a syntax error that prevents parsing.
    #[error("Invalid syntax in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while ordering or running tasks.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// The run was interrupted (Ctrl-C) before all tasks finished.
    #[error("Interrupted with {remaining} task(s) not run")]
    Interrupted {
        /// Number of tasks that never started.
        remaining: usize,
    },
}

/// Errors that arise from resource operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A symlink operation failed.
    #[error("Symlink error: {0}")]
    Symlink(String),

    /// A package could not be installed after every retry.
    #[error("Package installation failed after {attempts} attempt(s): {package}")]
    PackageInstall {
        /// Name of the package that could not be installed.
        package: String,
        /// Number of attempts made.
        attempts: u32,
        /// Error from the last attempt.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required file was not found.
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Fatal environment mismatches that abort the run before any task.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The current operating system is neither macOS nor Linux.
    #[error("Unsupported operating system: {platform}")]
    Unsupported {
        /// Name of the detected platform.
        platform: String,
    },

    /// The tool was started as root.
    #[error("Refusing to run as root; run as your normal user (sudo is requested when needed)")]
    RunningAsRoot,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_error_invalid_toggle_display() {
        let e = ConfigError::InvalidToggle {
            name: "BOOTSTRAP_GITHUB_AUTH".to_string(),
            value: "maybe".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid value 'maybe' for BOOTSTRAP_GITHUB_AUTH: expected ask, yes or no"
        );
    }

    #[test]
    fn config_error_unknown_directive_display() {
        let e = ConfigError::UnknownDirective("plugins".to_string());
        assert!(e.to_string().contains("'plugins'"));
    }

    #[test]
    fn config_error_invalid_directive_display() {
        let e = ConfigError::InvalidDirective {
            directive: "link".to_string(),
            message: "expected a mapping".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid 'link' directive: expected a mapping"
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/conf/bootstrap.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.to_string().contains("/conf/bootstrap.toml"));
        assert!(e.source().is_some());
    }

    #[test]
    fn task_error_interrupted_display() {
        let e = TaskError::Interrupted { remaining: 3 };
        assert_eq!(e.to_string(), "Interrupted with 3 task(s) not run");
    }

    #[test]
    fn resource_error_package_install_display() {
        let e = ResourceError::PackageInstall {
            package: "neovim".to_string(),
            attempts: 3,
            source: "apt-get: unable to locate package".into(),
        };
        assert_eq!(
            e.to_string(),
            "Package installation failed after 3 attempt(s): neovim"
        );
    }

    #[test]
    fn platform_error_root_display() {
        assert!(
            PlatformError::RunningAsRoot
                .to_string()
                .starts_with("Refusing to run as root")
        );
    }

    #[test]
    fn bootstrap_error_from_platform_error() {
        let e: BootstrapError = PlatformError::Unsupported {
            platform: "windows".to_string(),
        }
        .into();
        assert!(e.to_string().contains("Platform error"));
        assert!(e.to_string().contains("windows"));
    }

    #[test]
    fn bootstrap_error_from_config_error() {
        let e: BootstrapError = ConfigError::InvalidMode("0999".to_string()).into();
        assert!(e.to_string().contains("Configuration error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<BootstrapError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<TaskError>();
        assert_send_sync::<ResourceError>();
        assert_send_sync::<PlatformError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _a: anyhow::Error = TaskError::DependencyCycle("a → b → a".to_string()).into();
        let _b: anyhow::Error = ResourceError::NotFound("Brewfile".to_string()).into();
    }
}
