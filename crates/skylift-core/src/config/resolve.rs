//! Validation of merged configuration into closed store options
//!
//! Missing required fields are collected across all stores and reported
//! together. Malformed values and fields of the wrong API version fail
//! immediately.

use std::path::PathBuf;
use std::time::Duration;

use skylift_stores::chrome::CwsCredentials;
use skylift_stores::{
    ChromeApiVersion, ChromeOptions, ChromePublishTarget, ChromePublishType, EdgeAuth,
    EdgeOptions, FirefoxChannel, FirefoxOptions, PollOptions, SubmissionConfig,
};
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::{DEFAULT_CHROME_API_VERSION, DEFAULT_EDGE_API_VERSION};
use super::types::{ChromeConfig, EdgeConfig, FirefoxConfig, InlineConfig};

/// Collects the names of required fields that are unset
#[derive(Debug, Default)]
struct Missing(Vec<String>);

impl Missing {
    fn take<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(field.to_string());
        }
        value
    }

    fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields(self.0))
        }
    }
}

fn reject_present(variant: &str, fields: &[(&str, bool)]) -> Result<()> {
    let present: Vec<String> = fields
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name.to_string())
        .collect();
    if present.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ConflictingFields {
            variant: variant.to_string(),
            fields: present,
        })
    }
}

fn deploy_percentage(field: &str, value: Option<u32>) -> Result<Option<u8>> {
    match value {
        None => Ok(None),
        Some(p @ 1..=100) => Ok(Some(p as u8)),
        Some(p) => Err(ConfigError::invalid(
            field,
            format!("must be between 1 and 100, got {}", p),
        )),
    }
}

fn chrome_api(config: &ChromeConfig, missing: &mut Missing) -> Result<Option<ChromeApiVersion>> {
    let version = config
        .api_version
        .as_deref()
        .unwrap_or(DEFAULT_CHROME_API_VERSION);

    match version {
        "2" | "v2" => {
            reject_present(
                "Chrome Web Store API 2",
                &[("chrome.publish_target", config.publish_target.is_some())],
            )?;
            let publish_type = match config.publish_type.as_deref() {
                None | Some("DEFAULT_PUBLISH") => ChromePublishType::DefaultPublish,
                Some("STAGED_PUBLISH") => ChromePublishType::StagedPublish,
                Some(other) => {
                    return Err(ConfigError::invalid(
                        "chrome.publish_type",
                        format!("expected DEFAULT_PUBLISH or STAGED_PUBLISH, got {:?}", other),
                    ))
                }
            };
            let publisher_id = missing.take("chrome.publisher_id", config.publisher_id.clone());
            Ok(publisher_id.map(|publisher_id| ChromeApiVersion::V2 {
                publisher_id,
                publish_type,
                cancel_pending: config.cancel_pending.unwrap_or(false),
            }))
        }
        "1.1" | "v1.1" => {
            reject_present(
                "Chrome Web Store API 1.1",
                &[
                    ("chrome.publish_type", config.publish_type.is_some()),
                    ("chrome.cancel_pending", config.cancel_pending.is_some()),
                ],
            )?;
            let publish_target = match config.publish_target.as_deref() {
                None | Some("default") => ChromePublishTarget::Default,
                Some("trustedTesters") => ChromePublishTarget::TrustedTesters,
                Some(other) => {
                    return Err(ConfigError::invalid(
                        "chrome.publish_target",
                        format!("expected default or trustedTesters, got {:?}", other),
                    ))
                }
            };
            Ok(Some(ChromeApiVersion::V1_1 { publish_target }))
        }
        other => Err(ConfigError::invalid(
            "chrome.api_version",
            format!("expected 2 or 1.1, got {:?}", other),
        )),
    }
}

fn chrome_credentials(config: &ChromeConfig, missing: &mut Missing) -> Result<Option<CwsCredentials>> {
    let api = chrome_api(config, missing)?;
    let extension_id = missing.take("chrome.extension_id", config.extension_id.clone());
    let client_id = missing.take("chrome.client_id", config.client_id.clone());
    let client_secret = missing.take("chrome.client_secret", config.client_secret.clone());
    let refresh_token = missing.take("chrome.refresh_token", config.refresh_token.clone());

    Ok(match (api, extension_id, client_id, client_secret, refresh_token) {
        (Some(api), Some(extension_id), Some(client_id), Some(client_secret), Some(refresh_token)) => {
            Some(CwsCredentials {
                extension_id,
                client_id,
                client_secret,
                refresh_token,
                api,
            })
        }
        _ => None,
    })
}

fn chrome(zip: PathBuf, config: &ChromeConfig, missing: &mut Missing) -> Result<Option<ChromeOptions>> {
    let deploy_percentage = deploy_percentage("chrome.deploy_percentage", config.deploy_percentage)?;
    let credentials = chrome_credentials(config, missing)?;

    Ok(credentials.map(|c| ChromeOptions {
        zip,
        extension_id: c.extension_id,
        client_id: c.client_id,
        client_secret: c.client_secret,
        refresh_token: c.refresh_token,
        api: c.api,
        deploy_percentage,
        skip_review: config.skip_review.unwrap_or(false),
        skip_submit_review: config.skip_submit_review.unwrap_or(false),
    }))
}

fn firefox(zip: PathBuf, config: &FirefoxConfig, missing: &mut Missing) -> Result<Option<FirefoxOptions>> {
    let channel = match config.channel.as_deref() {
        None | Some("listed") => FirefoxChannel::Listed,
        Some("unlisted") => FirefoxChannel::Unlisted,
        Some(other) => {
            return Err(ConfigError::invalid(
                "firefox.channel",
                format!("expected listed or unlisted, got {:?}", other),
            ))
        }
    };
    let extension_id = missing.take("firefox.extension_id", config.extension_id.clone());
    let jwt_issuer = missing.take("firefox.jwt_issuer", config.jwt_issuer.clone());
    let jwt_secret = missing.take("firefox.jwt_secret", config.jwt_secret.clone());

    Ok(match (extension_id, jwt_issuer, jwt_secret) {
        (Some(extension_id), Some(jwt_issuer), Some(jwt_secret)) => Some(FirefoxOptions {
            zip,
            sources_zip: config.sources_zip.clone(),
            extension_id,
            jwt_issuer,
            jwt_secret,
            channel,
        }),
        _ => None,
    })
}

fn edge_auth(config: &EdgeConfig, missing: &mut Missing) -> Result<Option<EdgeAuth>> {
    let version = config
        .api_version
        .as_deref()
        .unwrap_or(DEFAULT_EDGE_API_VERSION);

    match version {
        "1.0" => {
            reject_present("Edge API 1.0", &[("edge.api_key", config.api_key.is_some())])?;
            let client_secret = missing.take("edge.client_secret", config.client_secret.clone());
            let access_token_url =
                missing.take("edge.access_token_url", config.access_token_url.clone());
            Ok(match (client_secret, access_token_url) {
                (Some(client_secret), Some(access_token_url)) => Some(EdgeAuth::ClientCredentials {
                    client_secret,
                    access_token_url,
                }),
                _ => None,
            })
        }
        "1.1" => {
            reject_present(
                "Edge API 1.1",
                &[
                    ("edge.client_secret", config.client_secret.is_some()),
                    ("edge.access_token_url", config.access_token_url.is_some()),
                ],
            )?;
            let api_key = missing.take("edge.api_key", config.api_key.clone());
            Ok(api_key.map(|api_key| EdgeAuth::ApiKey { api_key }))
        }
        other => Err(ConfigError::invalid(
            "edge.api_version",
            format!("expected 1.0 or 1.1, got {:?}", other),
        )),
    }
}

fn edge(zip: PathBuf, config: &EdgeConfig, missing: &mut Missing) -> Result<Option<EdgeOptions>> {
    let deploy_percentage = deploy_percentage("edge.deploy_percentage", config.deploy_percentage)?;
    let auth = edge_auth(config, missing)?;
    let product_id = missing.take("edge.product_id", config.product_id.clone());
    let client_id = missing.take("edge.client_id", config.client_id.clone());

    Ok(match (auth, product_id, client_id) {
        (Some(auth), Some(product_id), Some(client_id)) => Some(EdgeOptions {
            zip,
            product_id,
            client_id,
            auth,
            skip_submit_review: config.skip_submit_review.unwrap_or(false),
            deploy_percentage,
            skip_review: config.skip_review.unwrap_or(false),
            notes: config.notes.clone(),
        }),
        _ => None,
    })
}

fn poll_options(config: &InlineConfig) -> Result<PollOptions> {
    let defaults = PollOptions::default();
    let interval = match config.poll.interval_secs {
        Some(0) => {
            return Err(ConfigError::invalid(
                "poll.interval_secs",
                "must be at least 1 second",
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => defaults.interval,
    };
    let timeout = match config.poll.timeout_secs {
        Some(0) => {
            return Err(ConfigError::invalid(
                "poll.timeout_secs",
                "must be at least 1 second",
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => defaults.timeout,
    };
    Ok(PollOptions::new(interval, timeout))
}

/// Validate merged configuration into a [`SubmissionConfig`]
///
/// A store is included exactly when its ZIP is set.
pub fn resolve_config(config: &InlineConfig) -> Result<SubmissionConfig> {
    let mut missing = Missing::default();
    let poll = poll_options(config)?;

    let chrome = match &config.chrome.zip {
        Some(zip) => chrome(zip.clone(), &config.chrome, &mut missing)?,
        None => None,
    };
    let firefox = match &config.firefox.zip {
        Some(zip) => firefox(zip.clone(), &config.firefox, &mut missing)?,
        None => None,
    };
    let edge = match &config.edge.zip {
        Some(zip) => edge(zip.clone(), &config.edge, &mut missing)?,
        None => None,
    };
    missing.finish()?;

    let resolved = SubmissionConfig {
        dry_run: config.dry_run.unwrap_or(false),
        chrome,
        firefox,
        edge,
        poll,
    };
    debug!(stores = ?resolved.store_ids(), dry_run = resolved.dry_run, "configuration resolved");
    Ok(resolved)
}

/// Chrome Web Store credentials without requiring a ZIP
///
/// Used by the maintenance commands that don't upload anything.
pub fn resolve_chrome_credentials(config: &ChromeConfig) -> Result<CwsCredentials> {
    let mut missing = Missing::default();
    let credentials = chrome_credentials(config, &mut missing)?;
    missing.finish()?;
    credentials.ok_or_else(|| ConfigError::MissingFields(vec!["chrome".to_string()]))
}

/// OAuth client ID and secret for the Chrome refresh-token exchange
pub fn resolve_chrome_oauth_client(config: &ChromeConfig) -> Result<(String, String)> {
    let mut missing = Missing::default();
    let client_id = missing.take("chrome.client_id", config.client_id.clone());
    let client_secret = missing.take("chrome.client_secret", config.client_secret.clone());
    missing.finish()?;
    match (client_id, client_secret) {
        (Some(id), Some(secret)) => Ok((id, secret)),
        _ => Err(ConfigError::MissingFields(vec!["chrome.client_id".to_string()])),
    }
}
