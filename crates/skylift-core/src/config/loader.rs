//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::env::{inline_from_env, EnvSource};
use super::types::InlineConfig;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<InlineConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path)?;

    let config: InlineConfig = if format == "TOML" {
        toml::from_str(&content)?
    } else if content.trim().is_empty() {
        InlineConfig::default()
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `skylift.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/skylift.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Where each configuration layer comes from
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Values given as command line flags
    pub flags: InlineConfig,
    /// Explicit config file; searched for from `dir` when unset
    pub config_file: Option<PathBuf>,
    /// Directory the config file search starts from
    pub dir: PathBuf,
}

impl ConfigSources {
    /// Merge flags, config file and environment, highest precedence first
    ///
    /// Returns the merged configuration and the config file that was used.
    pub fn gather(&self, env: &dyn EnvSource) -> Result<(InlineConfig, Option<PathBuf>)> {
        let path = match &self.config_file {
            Some(path) => Some(path.clone()),
            None => find_config(&self.dir),
        };
        let file = match &path {
            Some(path) => load_config(path)?,
            None => InlineConfig::default(),
        };
        let env = inline_from_env(env)?;

        Ok((self.flags.clone().or(file).or(env), path))
    }
}
