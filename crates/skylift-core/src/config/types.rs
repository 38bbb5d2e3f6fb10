//! Configuration types
//!
//! Every field is optional: one `InlineConfig` is produced per source (flags,
//! config file, environment) and the sources are merged before validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Partial configuration as read from one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    /// Only check authentication
    pub dry_run: Option<bool>,

    /// Polling cadence
    pub poll: PollConfig,

    /// Chrome Web Store configuration
    pub chrome: ChromeConfig,

    /// Firefox Add-ons configuration
    pub firefox: FirefoxConfig,

    /// Edge Add-ons configuration
    pub edge: EdgeConfig,
}

/// Polling configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between status checks
    pub interval_secs: Option<u64>,
    /// Seconds before giving up on a store
    pub timeout_secs: Option<u64>,
}

/// Chrome Web Store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub zip: Option<PathBuf>,
    pub extension_id: Option<String>,
    pub publisher_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// `2` (default) or `1.1`
    pub api_version: Option<String>,
    /// v1.1 only: `default` or `trustedTesters`
    pub publish_target: Option<String>,
    /// v2 only: `DEFAULT_PUBLISH` or `STAGED_PUBLISH`
    pub publish_type: Option<String>,
    pub deploy_percentage: Option<u32>,
    pub skip_review: Option<bool>,
    pub skip_submit_review: Option<bool>,
    /// v2 only
    pub cancel_pending: Option<bool>,
}

/// Firefox Add-ons configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirefoxConfig {
    pub zip: Option<PathBuf>,
    pub sources_zip: Option<PathBuf>,
    pub extension_id: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_secret: Option<String>,
    /// `listed` (default) or `unlisted`
    pub channel: Option<String>,
}

/// Edge Add-ons configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub zip: Option<PathBuf>,
    pub product_id: Option<String>,
    pub client_id: Option<String>,
    /// `1.0` (default) or `1.1`
    pub api_version: Option<String>,
    /// API 1.0 only
    pub client_secret: Option<String>,
    /// API 1.0 only
    pub access_token_url: Option<String>,
    /// API 1.1 only
    pub api_key: Option<String>,
    pub skip_submit_review: Option<bool>,
    pub deploy_percentage: Option<u32>,
    pub skip_review: Option<bool>,
    pub notes: Option<String>,
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|p| !p.as_os_str().is_empty())
}

impl InlineConfig {
    /// Fill every unset field of `self` from `fallback`
    ///
    /// Blank strings and empty paths count as unset on both sides.
    pub fn or(self, fallback: InlineConfig) -> InlineConfig {
        InlineConfig {
            dry_run: self.dry_run.or(fallback.dry_run),
            poll: PollConfig {
                interval_secs: self.poll.interval_secs.or(fallback.poll.interval_secs),
                timeout_secs: self.poll.timeout_secs.or(fallback.poll.timeout_secs),
            },
            chrome: self.chrome.or(fallback.chrome),
            firefox: self.firefox.or(fallback.firefox),
            edge: self.edge.or(fallback.edge),
        }
    }
}

impl ChromeConfig {
    fn or(self, f: ChromeConfig) -> ChromeConfig {
        ChromeConfig {
            zip: path(self.zip).or(path(f.zip)),
            extension_id: text(self.extension_id).or(text(f.extension_id)),
            publisher_id: text(self.publisher_id).or(text(f.publisher_id)),
            client_id: text(self.client_id).or(text(f.client_id)),
            client_secret: text(self.client_secret).or(text(f.client_secret)),
            refresh_token: text(self.refresh_token).or(text(f.refresh_token)),
            api_version: text(self.api_version).or(text(f.api_version)),
            publish_target: text(self.publish_target).or(text(f.publish_target)),
            publish_type: text(self.publish_type).or(text(f.publish_type)),
            deploy_percentage: self.deploy_percentage.or(f.deploy_percentage),
            skip_review: self.skip_review.or(f.skip_review),
            skip_submit_review: self.skip_submit_review.or(f.skip_submit_review),
            cancel_pending: self.cancel_pending.or(f.cancel_pending),
        }
    }
}

impl FirefoxConfig {
    fn or(self, f: FirefoxConfig) -> FirefoxConfig {
        FirefoxConfig {
            zip: path(self.zip).or(path(f.zip)),
            sources_zip: path(self.sources_zip).or(path(f.sources_zip)),
            extension_id: text(self.extension_id).or(text(f.extension_id)),
            jwt_issuer: text(self.jwt_issuer).or(text(f.jwt_issuer)),
            jwt_secret: text(self.jwt_secret).or(text(f.jwt_secret)),
            channel: text(self.channel).or(text(f.channel)),
        }
    }
}

impl EdgeConfig {
    fn or(self, f: EdgeConfig) -> EdgeConfig {
        EdgeConfig {
            zip: path(self.zip).or(path(f.zip)),
            product_id: text(self.product_id).or(text(f.product_id)),
            client_id: text(self.client_id).or(text(f.client_id)),
            api_version: text(self.api_version).or(text(f.api_version)),
            client_secret: text(self.client_secret).or(text(f.client_secret)),
            access_token_url: text(self.access_token_url).or(text(f.access_token_url)),
            api_key: text(self.api_key).or(text(f.api_key)),
            skip_submit_review: self.skip_submit_review.or(f.skip_submit_review),
            deploy_percentage: self.deploy_percentage.or(f.deploy_percentage),
            skip_review: self.skip_review.or(f.skip_review),
            notes: text(self.notes).or(text(f.notes)),
        }
    }
}
