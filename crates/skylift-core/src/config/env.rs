//! Environment variable source
//!
//! The process environment takes precedence over the env file. Lookups go
//! through [`EnvSource`] so resolution can be tested without touching the
//! real environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{env_var_name, ConfigError, Result};

use super::defaults::{DRY_RUN_ENV, POLL_INTERVAL_ENV, POLL_TIMEOUT_ENV};
use super::types::{ChromeConfig, EdgeConfig, FirefoxConfig, InlineConfig, PollConfig};

/// Source of environment variables
pub trait EnvSource {
    /// Raw value of `key`
    fn var(&self, key: &str) -> Option<String>;

    /// Trimmed value of `key`; blank values count as unset
    fn get(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory variables, e.g. parsed from an env file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    /// Create an empty set of variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variable is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Two sources where `primary` wins over `fallback`
#[derive(Debug, Clone)]
pub struct LayeredEnv<P, F> {
    primary: P,
    fallback: F,
}

impl<P: EnvSource, F: EnvSource> LayeredEnv<P, F> {
    /// Layer `primary` over `fallback`
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvSource, F: EnvSource> EnvSource for LayeredEnv<P, F> {
    fn var(&self, key: &str) -> Option<String> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }
}

/// Read `KEY=value` lines from an env file; a missing file yields no variables
pub fn load_env_file(path: &Path) -> Result<MapEnv> {
    if !path.exists() {
        debug!(path = %path.display(), "env file not found, skipping");
        return Ok(MapEnv::new());
    }

    let mut vars = MapEnv::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    debug!(path = %path.display(), count = vars.len(), "loaded env file");
    Ok(vars)
}

/// Process environment layered over the given env file
pub fn process_env_with_file(path: &Path) -> Result<LayeredEnv<ProcessEnv, MapEnv>> {
    Ok(LayeredEnv::new(ProcessEnv, load_env_file(path)?))
}

/// Parse a boolean the way humans write them in env files
pub fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(ConfigError::invalid(
            field,
            format!("expected a boolean (true/false/1/0/yes/no), got {:?}", other),
        )),
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, format!("expected a whole number, got {:?}", value)))
}

struct Reader<'a> {
    env: &'a dyn EnvSource,
}

impl Reader<'_> {
    fn text(&self, field: &str) -> Option<String> {
        self.env.get(&env_var_name(field))
    }

    fn path(&self, field: &str) -> Option<PathBuf> {
        self.text(field).map(PathBuf::from)
    }

    fn flag(&self, field: &str) -> Result<Option<bool>> {
        self.text(field).map(|v| parse_bool(field, &v)).transpose()
    }

    fn number<T: FromStr>(&self, field: &str) -> Result<Option<T>> {
        self.text(field).map(|v| parse_number(field, &v)).transpose()
    }
}

/// Read every known variable from `env`
pub fn inline_from_env(env: &dyn EnvSource) -> Result<InlineConfig> {
    let r = Reader { env };

    let dry_run = env
        .get(DRY_RUN_ENV)
        .map(|v| parse_bool("dry_run", &v))
        .transpose()?;
    let interval_secs = env
        .get(POLL_INTERVAL_ENV)
        .map(|v| parse_number("poll.interval_secs", &v))
        .transpose()?;
    let timeout_secs = env
        .get(POLL_TIMEOUT_ENV)
        .map(|v| parse_number("poll.timeout_secs", &v))
        .transpose()?;

    Ok(InlineConfig {
        dry_run,
        poll: PollConfig {
            interval_secs,
            timeout_secs,
        },
        chrome: ChromeConfig {
            zip: r.path("chrome.zip"),
            extension_id: r.text("chrome.extension_id"),
            publisher_id: r.text("chrome.publisher_id"),
            client_id: r.text("chrome.client_id"),
            client_secret: r.text("chrome.client_secret"),
            refresh_token: r.text("chrome.refresh_token"),
            api_version: r.text("chrome.api_version"),
            publish_target: r.text("chrome.publish_target"),
            publish_type: r.text("chrome.publish_type"),
            deploy_percentage: r.number("chrome.deploy_percentage")?,
            skip_review: r.flag("chrome.skip_review")?,
            skip_submit_review: r.flag("chrome.skip_submit_review")?,
            cancel_pending: r.flag("chrome.cancel_pending")?,
        },
        firefox: FirefoxConfig {
            zip: r.path("firefox.zip"),
            sources_zip: r.path("firefox.sources_zip"),
            extension_id: r.text("firefox.extension_id"),
            jwt_issuer: r.text("firefox.jwt_issuer"),
            jwt_secret: r.text("firefox.jwt_secret"),
            channel: r.text("firefox.channel"),
        },
        edge: EdgeConfig {
            zip: r.path("edge.zip"),
            product_id: r.text("edge.product_id"),
            client_id: r.text("edge.client_id"),
            api_version: r.text("edge.api_version"),
            client_secret: r.text("edge.client_secret"),
            access_token_url: r.text("edge.access_token_url"),
            api_key: r.text("edge.api_key"),
            skip_submit_review: r.flag("edge.skip_submit_review")?,
            deploy_percentage: r.number("edge.deploy_percentage")?,
            skip_review: r.flag("edge.skip_review")?,
            notes: r.text("edge.notes"),
        },
    })
}
