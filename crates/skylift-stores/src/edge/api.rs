//! Microsoft Edge Add-ons API client
//!
//! Two incompatible auth schemes coexist: API 1.0 exchanges client
//! credentials for a bearer token, API 1.1 sends a static API key together
//! with the client ID on every request.

use std::path::Path;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::http::{check_auth_status, check_status};
use crate::types::{AccessToken, EdgeAuth, EdgeOptions};

const API_BASE_URL: &str = "https://api.addons.microsoftedge.microsoft.com/v1/products";
const TOKEN_SCOPE: &str = "https://api.addons.microsoftedge.microsoft.com/.default";

/// Scheme used by API 1.1 credentials
const API_KEY_SCHEME: &str = "ApiKey";

/// State of a draft package operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
}

/// Draft package operation
///
/// See <https://learn.microsoft.com/en-us/microsoft-edge/extensions-chromium/publish/api/addons-api-reference>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOperation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_updated_time: Option<String>,
    pub status: OperationStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
}

/// Publish options; absent fields are left out of the request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePublishRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_percentage: Option<u8>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_review: bool,
}

/// Edge Add-ons operations used by the adapter
#[async_trait::async_trait]
pub trait EdgeApi: Send + Sync {
    /// Acquire the credential sent with every request
    async fn get_token(&self) -> Result<AccessToken>;

    /// Upload a draft package, returning the operation ID
    async fn upload_draft(&self, token: &AccessToken, zip: &Path) -> Result<String>;

    /// Fetch the state of a draft package operation
    async fn draft_operation(&self, token: &AccessToken, operation_id: &str) -> Result<DraftOperation>;

    /// Publish the draft submission
    async fn publish(&self, token: &AccessToken, request: &EdgePublishRequest) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// reqwest implementation of [`EdgeApi`]
pub struct EdgeClient {
    client: Client,
    product_id: String,
    client_id: String,
    auth: EdgeAuth,
}

impl EdgeClient {
    /// Create a client for one product
    pub fn new(client: Client, options: &EdgeOptions) -> Self {
        Self {
            client,
            product_id: options.product_id.clone(),
            client_id: options.client_id.clone(),
            auth: options.auth.clone(),
        }
    }

    fn submissions_url(&self) -> String {
        format!("{}/{}/submissions", API_BASE_URL, self.product_id)
    }

    fn package_url(&self) -> String {
        format!("{}/draft/package", self.submissions_url())
    }

    fn authorize(&self, request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
        let request = request.header("Authorization", token.authorization());
        if token.token_type == API_KEY_SCHEME {
            request.header("X-ClientID", &self.client_id)
        } else {
            request
        }
    }
}

/// Operation ID from the `Location` header of a draft upload
///
/// The header may carry a bare ID or a URL ending in one.
pub fn operation_id_from_headers(headers: &HeaderMap) -> Result<String> {
    let location = headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            StoreError::Protocol(
                "Edge API did not return an operation ID in the Location header".to_string(),
            )
        })?;

    Ok(location
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(location)
        .to_string())
}

#[async_trait::async_trait]
impl EdgeApi for EdgeClient {
    #[instrument(skip(self))]
    async fn get_token(&self) -> Result<AccessToken> {
        match &self.auth {
            EdgeAuth::ApiKey { api_key } => Ok(AccessToken {
                token_type: API_KEY_SCHEME.to_string(),
                value: api_key.clone(),
                expires_at: None,
            }),
            EdgeAuth::ClientCredentials {
                client_secret,
                access_token_url,
            } => {
                let response = self
                    .client
                    .post(access_token_url)
                    .form(&[
                        ("client_id", self.client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", TOKEN_SCOPE),
                        ("grant_type", "client_credentials"),
                    ])
                    .send()
                    .await?;

                let token: TokenResponse = check_auth_status(response).await?.json().await?;
                Ok(AccessToken::bearer(token.access_token, token.expires_in))
            }
        }
    }

    #[instrument(skip(self, token), fields(zip = %zip.display()))]
    async fn upload_draft(&self, token: &AccessToken, zip: &Path) -> Result<String> {
        let bytes = tokio::fs::read(zip).await?;
        let url = self.package_url();
        debug!(bytes = bytes.len(), "POST {}", url);

        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/zip")
            .body(bytes);
        let response = self.authorize(request, token).send().await?;
        let response = check_status(response).await?;
        operation_id_from_headers(response.headers())
    }

    async fn draft_operation(&self, token: &AccessToken, operation_id: &str) -> Result<DraftOperation> {
        let url = format!("{}/operations/{}", self.package_url(), operation_id);
        let response = self.authorize(self.client.get(&url), token).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    #[instrument(skip(self, token))]
    async fn publish(&self, token: &AccessToken, request: &EdgePublishRequest) -> Result<()> {
        let builder = self.client.post(self.submissions_url()).json(request);
        let response = self.authorize(builder, token).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_operation_id_from_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("op-123"));
        assert_eq!(operation_id_from_headers(&headers).unwrap(), "op-123");

        headers.insert(
            LOCATION,
            HeaderValue::from_static("/v1/products/p/submissions/draft/package/operations/op-456"),
        );
        assert_eq!(operation_id_from_headers(&headers).unwrap(), "op-456");
    }

    #[test]
    fn test_missing_location_is_protocol_error() {
        let result = operation_id_from_headers(&HeaderMap::new());
        assert!(matches!(result, Err(StoreError::Protocol(_))));
    }

    #[test]
    fn test_publish_body_omits_absent_fields() {
        let body = serde_json::to_value(EdgePublishRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(EdgePublishRequest {
            notes: Some("Bug fixes".to_string()),
            deploy_percentage: Some(50),
            skip_review: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "notes": "Bug fixes", "deployPercentage": 50, "skipReview": true })
        );
    }

    #[test]
    fn test_draft_operation_parses_failure_payload() {
        let operation: DraftOperation = serde_json::from_value(serde_json::json!({
            "id": "op-1",
            "createdTime": "2024-01-01T00:00:00Z",
            "lastUpdatedTime": "2024-01-01T00:01:00Z",
            "status": "Failed",
            "message": "Package is invalid",
            "errorCode": "InvalidPackage",
            "errors": [{ "message": "manifest.json missing" }]
        }))
        .unwrap();
        assert_eq!(operation.status, OperationStatus::Failed);
        assert_eq!(operation.error_code.as_deref(), Some("InvalidPackage"));
    }

    #[tokio::test]
    async fn test_api_key_token_needs_no_request() {
        let client = EdgeClient::new(
            Client::new(),
            &EdgeOptions {
                zip: "edge.zip".into(),
                product_id: "product".to_string(),
                client_id: "client".to_string(),
                auth: EdgeAuth::ApiKey {
                    api_key: "key".to_string(),
                },
                skip_submit_review: false,
                deploy_percentage: None,
                skip_review: false,
                notes: None,
            },
        );
        let token = client.get_token().await.unwrap();
        assert_eq!(token.authorization(), "ApiKey key");
    }
}
