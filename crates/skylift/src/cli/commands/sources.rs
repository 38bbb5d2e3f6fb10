//! Configuration flags shared by commands that talk to the stores

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use skylift_core::config::{process_env_with_file, DEFAULT_ENV_FILE};
use skylift_core::{ConfigSources, InlineConfig};

/// Where to read configuration from
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Config file (searched for when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Env file with store credentials; a missing file is ignored
    #[arg(long, env = "SKYLIFT_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
}

impl ConfigArgs {
    /// Merge `flags` over the config file, process environment and env file
    pub fn gather(&self, flags: InlineConfig) -> anyhow::Result<InlineConfig> {
        let env = process_env_with_file(&self.env_file)?;
        let sources = ConfigSources {
            flags,
            config_file: self.config.clone(),
            dir: std::env::current_dir()?,
        };

        let (config, path) = sources.gather(&env)?;
        match path {
            Some(path) => debug!(path = %path.display(), "using config file"),
            None => debug!("no config file, using flags and environment"),
        }
        Ok(config)
    }
}
