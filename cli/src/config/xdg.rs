//! XDG base directory resolution.
use std::path::{Path, PathBuf};

use super::EnvLookup;

/// One XDG base directory variable with its home-relative default.
#[derive(Debug, Clone, Copy)]
struct BaseDir {
    var: &'static str,
    default: &'static str,
}

const BASE_DIRS: [BaseDir; 4] = [
    BaseDir { var: "XDG_CONFIG_HOME", default: ".config" },
    BaseDir { var: "XDG_DATA_HOME", default: ".local/share" },
    BaseDir { var: "XDG_CACHE_HOME", default: ".cache" },
    BaseDir { var: "XDG_STATE_HOME", default: ".local/state" },
];

/// Resolved XDG base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XdgDirs {
    /// `XDG_CONFIG_HOME`.
    pub config: PathBuf,
    /// `XDG_DATA_HOME`.
    pub data: PathBuf,
    /// `XDG_CACHE_HOME`.
    pub cache: PathBuf,
    /// `XDG_STATE_HOME`.
    pub state: PathBuf,
    /// Profile export lines, in the order above.
    exports: Vec<String>,
}

/// Absolute value of `var`, if set. XDG ignores relative values.
fn absolute(env: EnvLookup<'_>, var: &str) -> Option<String> {
    env(var).filter(|v| Path::new(v).is_absolute())
}

impl XdgDirs {
    /// Resolve every base directory from the environment, falling back to
    /// the defaults under `home`.
    #[must_use]
    pub fn resolve(home: &Path, env: EnvLookup<'_>) -> Self {
        let [config, data, cache, state] = BASE_DIRS.map(|dir| {
            let user = absolute(env, dir.var);
            let path = user.as_ref().map_or_else(|| home.join(dir.default), PathBuf::from);
            let value = user.unwrap_or_else(|| format!("$HOME/{}", dir.default));
            (path, format!("export {}=\"{value}\"", dir.var))
        });
        Self {
            exports: vec![config.1, data.1, cache.1, state.1],
            config: config.0,
            data: data.0,
            cache: cache.0,
            state: state.0,
        }
    }

    /// All four directories.
    #[must_use]
    pub fn all(&self) -> [&Path; 4] {
        [&self.config, &self.data, &self.cache, &self.state]
    }

    /// `export XDG_*_HOME="..."` lines for the shell profile.
    #[must_use]
    pub fn export_lines(&self) -> &[String] {
        &self.exports
    }
}
