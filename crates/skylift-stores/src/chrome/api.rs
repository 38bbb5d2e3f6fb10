//! Chrome Web Store API client
//!
//! Supports both the `chromewebstore.googleapis.com/v2` API and the legacy
//! `chromewebstore/v1.1` API. Which one is used is decided by
//! [`ChromeApiVersion`] in the credentials.

use std::path::Path;

use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Result, StoreError};
use crate::http::{check_auth_status, check_status};
use crate::types::{AccessToken, ChromeApiVersion, ChromeOptions};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/chromewebstore";
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const V2_BASE_URL: &str = "https://chromewebstore.googleapis.com";
const V1_BASE_URL: &str = "https://www.googleapis.com";

/// Everything needed to talk to the Chrome Web Store for one item
#[derive(Debug, Clone)]
pub struct CwsCredentials {
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
}

impl From<&ChromeOptions> for CwsCredentials {
    fn from(options: &ChromeOptions) -> Self {
        Self {
            extension_id: options.extension_id.clone(),
            client_id: options.client_id.clone(),
            client_secret: options.client_secret.clone(),
            refresh_token: options.refresh_token.clone(),
            api: options.api.clone(),
        }
    }
}

/// Processing state of an uploaded package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Package accepted
    Succeeded,
    /// Still being processed
    InProgress,
    /// Package rejected
    Failed,
    /// No upload found for the item
    NotFound,
    /// A state this client does not know about
    Unknown(String),
}

impl UploadState {
    fn parse(state: &str) -> Self {
        match state {
            "SUCCESS" | "SUCCEEDED" => UploadState::Succeeded,
            "IN_PROGRESS" => UploadState::InProgress,
            "FAILURE" | "FAILED" => UploadState::Failed,
            "NOT_FOUND" => UploadState::NotFound,
            other => UploadState::Unknown(other.to_string()),
        }
    }
}

/// Upload result or item status as reported by the store
#[derive(Debug, Clone)]
pub struct UploadStatus {
    /// Upload processing state
    pub state: UploadState,
    /// Item errors reported alongside a failed upload
    pub errors: Vec<String>,
    /// Full response body
    pub raw: serde_json::Value,
}

impl UploadStatus {
    /// Interpret a v1.1 or v2 response body
    pub fn from_value(raw: serde_json::Value) -> Self {
        let state = raw
            .get("uploadState")
            .or_else(|| raw.get("lastAsyncUploadState"))
            .and_then(|s| s.as_str())
            .map(UploadState::parse)
            .unwrap_or(UploadState::Unknown(String::new()));

        let errors = raw
            .get("itemError")
            .and_then(|e| e.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        item.get("error_detail")
                            .and_then(|d| d.as_str())
                            .map(str::to_string)
                            .unwrap_or_else(|| item.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { state, errors, raw }
    }
}

/// Publish options shared by both API versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    /// Staged rollout percentage
    pub deploy_percentage: Option<u8>,
    /// Ask for review exemption
    pub skip_review: bool,
}

/// Chrome Web Store operations used by the adapter and the `chrome` commands
#[async_trait::async_trait]
pub trait CwsApi: Send + Sync {
    /// Exchange the refresh token for an access token
    async fn get_token(&self) -> Result<AccessToken>;

    /// Cancel the item's pending submission
    async fn cancel_submission(&self, token: &AccessToken) -> Result<()>;

    /// Upload a new package
    async fn upload_zip(&self, token: &AccessToken, zip: &Path) -> Result<UploadStatus>;

    /// Fetch the item's current status
    async fn fetch_status(&self, token: &AccessToken) -> Result<UploadStatus>;

    /// Submit the uploaded package for review
    async fn publish(&self, token: &AccessToken, request: &PublishRequest) -> Result<()>;

    /// Change the rollout percentage of the published revision
    async fn set_published_deploy_percentage(
        &self,
        token: &AccessToken,
        percentage: u8,
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> AccessToken {
        let mut token = AccessToken::bearer(self.access_token, self.expires_in);
        if let Some(token_type) = self.token_type {
            token.token_type = token_type;
        }
        token
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct V2PublishBody {
    publish_type: crate::types::ChromePublishType,
    #[serde(skip_serializing_if = "Option::is_none")]
    deploy_infos: Option<Vec<DeployInfo>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    skip_review: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeployInfo {
    deploy_percentage: u8,
}

/// reqwest implementation of [`CwsApi`]
pub struct CwsClient {
    client: Client,
    credentials: CwsCredentials,
}

impl CwsClient {
    /// Create a client for one item
    pub fn new(client: Client, credentials: CwsCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    fn item_id(&self) -> &str {
        &self.credentials.extension_id
    }

    fn v2_item_url(&self, publisher_id: &str, action: &str) -> String {
        format!(
            "{}/v2/publishers/{}/items/{}:{}",
            V2_BASE_URL,
            publisher_id,
            self.item_id(),
            action
        )
    }

    fn upload_url(&self) -> String {
        match &self.credentials.api {
            ChromeApiVersion::V2 { publisher_id, .. } => format!(
                "{}/upload/v2/publishers/{}/items/{}:upload",
                V2_BASE_URL,
                publisher_id,
                self.item_id()
            ),
            ChromeApiVersion::V1_1 { .. } => format!(
                "{}/upload/chromewebstore/v1.1/items/{}",
                V1_BASE_URL,
                self.item_id()
            ),
        }
    }

    fn status_url(&self) -> String {
        match &self.credentials.api {
            ChromeApiVersion::V2 { publisher_id, .. } => {
                self.v2_item_url(publisher_id, "fetchStatus")
            }
            ChromeApiVersion::V1_1 { .. } => format!(
                "{}/chromewebstore/v1.1/items/{}?projection=DRAFT",
                V1_BASE_URL,
                self.item_id()
            ),
        }
    }

    /// v1.1 publish URL; options travel as query parameters, absent ones are omitted
    fn v1_publish_url(&self, request: &PublishRequest) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/chromewebstore/v1.1/items/{}/publish",
            V1_BASE_URL,
            self.item_id()
        ))
        .map_err(|e| StoreError::Other(format!("Invalid publish URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            if let ChromeApiVersion::V1_1 { publish_target } = &self.credentials.api {
                query.append_pair("publishTarget", publish_target.as_str());
            }
            if let Some(percentage) = request.deploy_percentage {
                query.append_pair("deployPercentage", &percentage.to_string());
            }
            if request.skip_review {
                query.append_pair("reviewExemption", "true");
            }
        }
        Ok(url)
    }

    fn v2_publish_body(&self, request: &PublishRequest) -> V2PublishBody {
        let publish_type = match &self.credentials.api {
            ChromeApiVersion::V2 { publish_type, .. } => *publish_type,
            ChromeApiVersion::V1_1 { .. } => Default::default(),
        };
        V2PublishBody {
            publish_type,
            deploy_infos: request
                .deploy_percentage
                .map(|deploy_percentage| vec![DeployInfo { deploy_percentage }]),
            skip_review: request.skip_review,
        }
    }

    async fn read_status(response: reqwest::Response) -> Result<UploadStatus> {
        let body: serde_json::Value = check_status(response).await?.json().await?;
        Ok(UploadStatus::from_value(body))
    }
}

#[async_trait::async_trait]
impl CwsApi for CwsClient {
    #[instrument(skip(self))]
    async fn get_token(&self) -> Result<AccessToken> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
                ("redirect_uri", OOB_REDIRECT_URI),
            ])
            .send()
            .await?;

        let token: TokenResponse = check_auth_status(response).await?.json().await?;
        Ok(token.into_token())
    }

    async fn cancel_submission(&self, token: &AccessToken) -> Result<()> {
        let ChromeApiVersion::V2 { publisher_id, .. } = &self.credentials.api else {
            return Err(StoreError::Unsupported(
                "cancelling a pending submission requires Chrome Web Store API v2".to_string(),
            ));
        };

        let url = self.v2_item_url(publisher_id, "cancelSubmission");
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", token.authorization())
            .header("Content-Length", "0")
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(zip = %zip.display()))]
    async fn upload_zip(&self, token: &AccessToken, zip: &Path) -> Result<UploadStatus> {
        let bytes = tokio::fs::read(zip).await?;
        let url = self.upload_url();
        debug!(bytes = bytes.len(), "uploading to {}", url);

        let request = match &self.credentials.api {
            ChromeApiVersion::V2 { .. } => self
                .client
                .post(&url)
                .header("Content-Type", "application/zip")
                .body(bytes),
            ChromeApiVersion::V1_1 { .. } => {
                let file_name = zip
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("extension.zip")
                    .to_string();
                let part = multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("application/zip")?;
                self.client
                    .put(&url)
                    .header("x-goog-api-version", "2")
                    .multipart(multipart::Form::new().part("image", part))
            }
        };

        let response = request
            .header("Authorization", token.authorization())
            .send()
            .await?;
        Self::read_status(response).await
    }

    async fn fetch_status(&self, token: &AccessToken) -> Result<UploadStatus> {
        let response = self
            .client
            .get(self.status_url())
            .header("Authorization", token.authorization())
            .header("x-goog-api-version", "2")
            .send()
            .await?;
        Self::read_status(response).await
    }

    #[instrument(skip(self, token))]
    async fn publish(&self, token: &AccessToken, request: &PublishRequest) -> Result<()> {
        let response = match &self.credentials.api {
            ChromeApiVersion::V2 { publisher_id, .. } => {
                self.client
                    .post(self.v2_item_url(publisher_id, "publish"))
                    .header("Authorization", token.authorization())
                    .json(&self.v2_publish_body(request))
                    .send()
                    .await?
            }
            ChromeApiVersion::V1_1 { .. } => {
                self.client
                    .post(self.v1_publish_url(request)?)
                    .header("Authorization", token.authorization())
                    .header("x-goog-api-version", "2")
                    .header("Content-Length", "0")
                    .send()
                    .await?
            }
        };
        check_status(response).await?;
        Ok(())
    }

    async fn set_published_deploy_percentage(
        &self,
        token: &AccessToken,
        percentage: u8,
    ) -> Result<()> {
        let ChromeApiVersion::V2 { publisher_id, .. } = &self.credentials.api else {
            return Err(StoreError::Unsupported(
                "setting the deploy percentage requires Chrome Web Store API v2".to_string(),
            ));
        };

        let response = self
            .client
            .post(self.v2_item_url(publisher_id, "setPublishedDeployPercentage"))
            .header("Authorization", token.authorization())
            .json(&serde_json::json!({ "deployPercentage": percentage }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCodeTokens {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token to store as `CHROME_REFRESH_TOKEN`
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Consent URL the user opens to authorize the OAuth client
pub fn consent_url(client_id: &str) -> Result<Url> {
    Url::parse_with_params(
        AUTH_URL,
        &[
            ("response_type", "code"),
            ("scope", OAUTH_SCOPE),
            ("client_id", client_id),
            ("redirect_uri", OOB_REDIRECT_URI),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| StoreError::Other(format!("Invalid consent URL: {}", e)))
}

/// Exchange an authorization code for a refresh token
pub async fn exchange_auth_code(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<AuthCodeTokens> {
    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", OOB_REDIRECT_URI),
        ])
        .send()
        .await?;

    Ok(check_auth_status(response).await?.json().await?)
}
