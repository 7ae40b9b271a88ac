pub mod links;
pub mod packages;
pub mod paths;
pub mod settings;
pub mod validation;
pub mod xdg;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::platform::Platform;

/// Environment variable lookup, injectable so tests never touch the process
/// environment.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Settings file location relative to the root.
pub const SETTINGS_FILE: &str = "conf/bootstrap.toml";

/// All loaded configuration for the current platform.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotfiles root.
    pub root: PathBuf,
    /// Home directory links and directories are resolved against.
    pub home: PathBuf,
    /// Tool settings.
    pub settings: settings::Settings,
    /// Dotbot directives.
    pub links: links::LinkConfig,
    /// Package list for this platform.
    pub packages: packages::PackageList,
    /// Brewfile to apply (macOS, when present).
    pub brewfile: Option<PathBuf>,
    /// Resolved XDG base directories.
    pub xdg: xdg::XdgDirs,
    /// Shell profile receiving environment lines.
    pub profile_file: PathBuf,
}

impl Config {
    /// Load all configuration from the dotfiles root.
    ///
    /// `settings_path` overrides [`SETTINGS_FILE`]; a relative override is
    /// taken relative to the root.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is unreadable or malformed, or an
    /// environment override holds an invalid value.
    pub fn load(
        root: &Path,
        home: &Path,
        settings_path: Option<&Path>,
        platform: &Platform,
        env: EnvLookup<'_>,
    ) -> Result<Self, ConfigError> {
        let settings_path = settings_path.map_or_else(|| root.join(SETTINGS_FILE), |p| root.join(p));
        let mut settings = settings::Settings::load(&settings_path)?;
        settings.apply_env(env)?;

        let links_path = paths::resolve_source(&settings.links.config, root, home, env);
        let links = links::LinkConfig::load(&links_path, root, home, env)?;

        let list = if platform.is_macos() {
            &settings.packages.brew
        } else {
            &settings.packages.apt
        };
        let packages =
            packages::PackageList::load(&paths::resolve_source(list, root, home, env))?;

        let brewfile = platform
            .is_macos()
            .then(|| paths::resolve_source(&settings.packages.brewfile, root, home, env))
            .filter(|p| p.is_file());

        let xdg = xdg::XdgDirs::resolve(home, env);
        let profile_file = paths::resolve_target(&settings.profile_file(), home, env);

        Ok(Self {
            root: root.to_path_buf(),
            home: home.to_path_buf(),
            settings,
            links,
            packages,
            brewfile,
            xdg,
            profile_file,
        })
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Environment with no variables set.
    pub fn no_env(_: &str) -> Option<String> {
        None
    }

    /// Configuration with default settings and nothing declared.
    pub fn empty_config(root: &Path, home: &Path) -> Config {
        let settings = settings::Settings::default();
        Config {
            root: root.to_path_buf(),
            home: home.to_path_buf(),
            profile_file: home.join(".zprofile"),
            settings,
            links: links::LinkConfig::default(),
            packages: packages::PackageList::default(),
            brewfile: None,
            xdg: xdg::XdgDirs::resolve(home, &no_env),
        }
    }
}
