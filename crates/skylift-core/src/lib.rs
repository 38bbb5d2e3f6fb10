//! Skylift Core - configuration for multi-store extension submission
//!
//! This crate gathers configuration from flags, config files and the
//! environment, and validates it into the closed option types the store
//! adapters in `skylift-stores` consume.

pub mod config;
pub mod error;

pub use config::{
    find_config, load_config, resolve_chrome_credentials, resolve_chrome_oauth_client,
    resolve_config, ConfigSources, EnvSource, InlineConfig, LayeredEnv, MapEnv, ProcessEnv,
};
pub use error::{env_var_name, ConfigError, Result};
