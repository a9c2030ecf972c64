//! `.vinter` configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File names looked up in the working directory, in order.
pub const PROJECT_FILES: [&str; 3] = [".vinter.yaml", ".vinter.yml", ".vinter"];

/// User-level file, relative to the home directory.
pub const USER_FILE: &str = ".vinter";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Linter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule ids that are never run.
    pub ignore_rules: Vec<String>,
}

impl Config {
    /// Parse YAML text. An empty document is the default configuration.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), ignored = config.ignore_rules.len(), "loaded config");
        Ok(config)
    }

    /// Load the first configuration found in `cwd`, then `home`.
    /// Defaults when neither has one.
    pub fn discover(cwd: &Path, home: Option<&Path>) -> Result<Self, ConfigError> {
        match find(cwd, home) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Path of the configuration file [`Config::discover`] would read.
#[must_use]
pub fn find(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    PROJECT_FILES
        .iter()
        .map(|name| cwd.join(name))
        .chain(home.map(|h| h.join(USER_FILE)))
        .find(|path| path.is_file())
}
