//! Common types for store adapters

use chrono::{DateTime, Duration, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::poll::PollOptions;

/// Store identifier
///
/// Ordering follows the fixed preference order used when reporting:
/// chrome, firefox, edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreId {
    /// Chrome Web Store
    Chrome,
    /// Firefox Add-ons (addons.mozilla.org)
    Firefox,
    /// Microsoft Edge Add-ons
    Edge,
}

impl StoreId {
    /// All stores, in preference order
    pub const ALL: [StoreId; 3] = [StoreId::Chrome, StoreId::Firefox, StoreId::Edge];

    /// Short key used in result maps and status prefixes
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreId::Chrome => "chrome",
            StoreId::Firefox => "firefox",
            StoreId::Edge => "edge",
        }
    }

    /// Human readable store name
    pub fn display_name(&self) -> &'static str {
        match self {
            StoreId::Chrome => "Chrome Web Store",
            StoreId::Firefox => "Firefox Addon Store",
            StoreId::Edge => "Edge Addon Store",
        }
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one attempted store submission
#[derive(Debug)]
pub enum SubmissionResult {
    /// The full protocol (or the dry-run auth check) completed
    Success,
    /// The submission failed; other stores are unaffected
    Failure { error: StoreError },
}

impl SubmissionResult {
    /// Whether the submission succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            SubmissionResult::Success => None,
            SubmissionResult::Failure { error } => Some(error),
        }
    }
}

impl From<crate::error::Result<()>> for SubmissionResult {
    fn from(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => SubmissionResult::Success,
            Err(error) => SubmissionResult::Failure { error },
        }
    }
}

impl Serialize for SubmissionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SubmissionResult::Success => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", &true)?;
                map.end()
            }
            SubmissionResult::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &error.to_string())?;
                map.end()
            }
        }
    }
}

/// Results keyed by store; an absent key means the store was not attempted
pub type SubmitResults = BTreeMap<StoreId, SubmissionResult>;

/// Number of failed submissions in a results map
pub fn failure_count(results: &SubmitResults) -> usize {
    results.values().filter(|r| !r.is_success()).count()
}

/// Vendor bearer credential, re-acquired every run and never persisted
#[derive(Clone)]
pub struct AccessToken {
    /// Authorization scheme, e.g. `Bearer` or `ApiKey`
    pub token_type: String,
    /// Credential value
    pub value: String,
    /// End of the validity window, when the vendor reports one
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a bearer token, optionally expiring `expires_in` seconds from now
    pub fn bearer(value: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            value: value.into(),
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Chrome Web Store publish target (API v1.1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChromePublishTarget {
    /// Publish to everyone
    #[default]
    Default,
    /// Publish to trusted testers only
    TrustedTesters,
}

impl ChromePublishTarget {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            ChromePublishTarget::Default => "default",
            ChromePublishTarget::TrustedTesters => "trustedTesters",
        }
    }
}

/// Chrome Web Store publish type (API v2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChromePublishType {
    /// Publish as soon as the review passes
    #[default]
    DefaultPublish,
    /// Hold the approved item until it is published manually
    StagedPublish,
}

/// Chrome Web Store API version and the fields only that version accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromeApiVersion {
    /// Legacy `chromewebstore/v1.1` API
    V1_1 { publish_target: ChromePublishTarget },
    /// `chromewebstore.googleapis.com/v2` API
    V2 {
        publisher_id: String,
        publish_type: ChromePublishType,
        /// Cancel a pending submission before uploading
        cancel_pending: bool,
    },
}

/// Chrome Web Store configuration
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Extension package to upload
    pub zip: PathBuf,
    /// Item ID of the extension
    pub extension_id: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived OAuth refresh token
    pub refresh_token: String,
    /// API version specific options
    pub api: ChromeApiVersion,
    /// Staged rollout percentage (1-100)
    pub deploy_percentage: Option<u8>,
    /// Ask for review exemption when the item qualifies
    pub skip_review: bool,
    /// Upload only; don't submit for review
    pub skip_submit_review: bool,
}

/// Firefox distribution channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirefoxChannel {
    /// Listed on addons.mozilla.org
    #[default]
    Listed,
    /// Self-distributed, signed only
    Unlisted,
}

impl FirefoxChannel {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            FirefoxChannel::Listed => "listed",
            FirefoxChannel::Unlisted => "unlisted",
        }
    }
}

/// Firefox Add-ons configuration
#[derive(Debug, Clone)]
pub struct FirefoxOptions {
    /// Extension package to upload
    pub zip: PathBuf,
    /// Source code archive for manual review
    pub sources_zip: Option<PathBuf>,
    /// Add-on GUID or email-style ID
    pub extension_id: String,
    /// API key (JWT issuer)
    pub jwt_issuer: String,
    /// API secret (JWT signing secret)
    pub jwt_secret: String,
    /// Distribution channel
    pub channel: FirefoxChannel,
}

/// Edge Add-ons credentials, one variant per API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeAuth {
    /// API 1.0: OAuth client-credentials exchange
    ClientCredentials {
        client_secret: String,
        access_token_url: String,
    },
    /// API 1.1: static API key
    ApiKey { api_key: String },
}

impl EdgeAuth {
    /// API version this credential shape belongs to
    pub fn api_version(&self) -> &'static str {
        match self {
            EdgeAuth::ClientCredentials { .. } => "1.0",
            EdgeAuth::ApiKey { .. } => "1.1",
        }
    }
}

/// Edge Add-ons configuration
#[derive(Debug, Clone)]
pub struct EdgeOptions {
    /// Extension package to upload
    pub zip: PathBuf,
    /// Partner Center product ID
    pub product_id: String,
    /// Client ID
    pub client_id: String,
    /// Version specific credentials
    pub auth: EdgeAuth,
    /// Upload only; don't submit for review
    pub skip_submit_review: bool,
    /// Staged rollout percentage (1-100)
    pub deploy_percentage: Option<u8>,
    /// Request an expedited review
    pub skip_review: bool,
    /// Notes for the certification team
    pub notes: Option<String>,
}

/// Fully resolved submission configuration
///
/// A store's options are present exactly when its ZIP was supplied; absent
/// stores are neither attempted nor reported.
#[derive(Debug, Clone, Default)]
pub struct SubmissionConfig {
    /// Only check authentication, don't upload or publish
    pub dry_run: bool,
    /// Chrome Web Store options
    pub chrome: Option<ChromeOptions>,
    /// Firefox Add-ons options
    pub firefox: Option<FirefoxOptions>,
    /// Edge Add-ons options
    pub edge: Option<EdgeOptions>,
    /// Polling cadence shared by every store
    pub poll: PollOptions,
}

impl SubmissionConfig {
    /// Stores that will be attempted, in preference order
    pub fn store_ids(&self) -> Vec<StoreId> {
        StoreId::ALL
            .into_iter()
            .filter(|id| match id {
                StoreId::Chrome => self.chrome.is_some(),
                StoreId::Firefox => self.firefox.is_some(),
                StoreId::Edge => self.edge.is_some(),
            })
            .collect()
    }

    /// Whether no store is configured
    pub fn is_empty(&self) -> bool {
        self.store_ids().is_empty()
    }
}
