//! Firefox Add-ons (addons.mozilla.org) API v5 client
//!
//! Every request carries a freshly minted HS256 JWT built from the API key
//! (issuer) and secret.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::http::check_status;
use crate::types::{FirefoxChannel, FirefoxOptions};

const API_BASE_URL: &str = "https://addons.mozilla.org/api/v5/addons";

/// Lifetime of each signed request token, in seconds
const JWT_LIFETIME_SECS: i64 = 30;

/// Add-on ID as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AddonId {
    /// Numeric AMO id
    Numeric(u64),
    /// GUID or slug
    Text(String),
}

impl std::fmt::Display for AddonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddonId::Numeric(id) => write!(f, "{}", id),
            AddonId::Text(id) => f.write_str(id),
        }
    }
}

/// Add-on detail
#[derive(Debug, Clone, Deserialize)]
pub struct AddonDetails {
    pub id: AddonId,
    #[serde(default)]
    pub guid: Option<String>,
}

/// Validation counts of a processed upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationCounts {
    #[serde(default)]
    pub errors: u32,
    #[serde(default)]
    pub warnings: u32,
    #[serde(default)]
    pub notices: u32,
}

/// Upload detail
#[derive(Debug, Clone, Deserialize)]
pub struct UploadDetails {
    pub uuid: String,
    #[serde(default)]
    pub channel: Option<FirefoxChannel>,
    pub processed: bool,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub validation: Option<ValidationCounts>,
    #[serde(default)]
    pub version: Option<String>,
}

impl UploadDetails {
    /// Validation counts, zero until processed
    pub fn counts(&self) -> ValidationCounts {
        self.validation.unwrap_or_default()
    }
}

/// File attached to a created version
#[derive(Debug, Clone, Deserialize)]
pub struct VersionFile {
    pub id: u64,
}

/// Created version
#[derive(Debug, Clone, Deserialize)]
pub struct AddonVersion {
    pub id: u64,
    #[serde(default)]
    pub file: Option<VersionFile>,
}

/// Firefox Add-ons operations used by the adapter
#[async_trait::async_trait]
pub trait AddonsApi: Send + Sync {
    /// Fetch add-on details; doubles as the credential check
    async fn details(&self, extension_id: &str) -> Result<AddonDetails>;

    /// Upload a package for validation
    async fn upload_create(&self, zip: &Path, channel: FirefoxChannel) -> Result<UploadDetails>;

    /// Re-fetch an upload's processing state
    async fn upload_detail(&self, uuid: &str) -> Result<UploadDetails>;

    /// Create a new version from a processed upload, attaching sources if given
    async fn version_create(
        &self,
        extension_id: &str,
        upload_uuid: &str,
        source: Option<&Path>,
    ) -> Result<AddonVersion>;
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    jti: String,
    iat: i64,
    exp: i64,
}

/// reqwest implementation of [`AddonsApi`]
pub struct AddonsClient {
    client: Client,
    jwt_issuer: String,
    jwt_secret: String,
}

impl AddonsClient {
    /// Create a client for the given API key pair
    pub fn new(client: Client, jwt_issuer: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            client,
            jwt_issuer: jwt_issuer.into(),
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Create a client from resolved Firefox options
    pub fn from_options(client: Client, options: &FirefoxOptions) -> Self {
        Self::new(client, &options.jwt_issuer, &options.jwt_secret)
    }

    /// Mint a short-lived signed token
    fn create_jwt(&self) -> Result<String> {
        let issued_at = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.jwt_issuer,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: issued_at,
            exp: issued_at + JWT_LIFETIME_SECS,
        };
        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    fn auth_header(&self) -> Result<String> {
        Ok(format!("JWT {}", self.create_jwt()?))
    }

    async fn file_part(path: &Path) -> Result<multipart::Part> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("extension.zip")
            .to_string();
        Ok(multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/zip")?)
    }
}

#[async_trait::async_trait]
impl AddonsApi for AddonsClient {
    async fn details(&self, extension_id: &str) -> Result<AddonDetails> {
        let url = format!("{}/addon/{}/", API_BASE_URL, extension_id);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    #[instrument(skip(self), fields(zip = %zip.display()))]
    async fn upload_create(&self, zip: &Path, channel: FirefoxChannel) -> Result<UploadDetails> {
        let form = multipart::Form::new()
            .text("channel", channel.as_str())
            .part("upload", Self::file_part(zip).await?);

        let response = self
            .client
            .post(format!("{}/upload/", API_BASE_URL))
            .header("Authorization", self.auth_header()?)
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn upload_detail(&self, uuid: &str) -> Result<UploadDetails> {
        let response = self
            .client
            .get(format!("{}/upload/{}/", API_BASE_URL, uuid))
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn version_create(
        &self,
        extension_id: &str,
        upload_uuid: &str,
        source: Option<&Path>,
    ) -> Result<AddonVersion> {
        let request = self
            .client
            .post(format!("{}/addon/{}/versions/", API_BASE_URL, extension_id))
            .header("Authorization", self.auth_header()?);

        let request = match source {
            Some(source) => request.multipart(
                multipart::Form::new()
                    .text("upload", upload_uuid.to_string())
                    .part("source", Self::file_part(source).await?),
            ),
            None => request.json(&serde_json::json!({ "upload": upload_uuid })),
        };

        let response = request.send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

/// Wrap a GUID in braces as the API requires; email-style IDs pass through
pub fn wrap_extension_id(extension_id: &str) -> String {
    let id = extension_id.trim();
    if id.contains('@') {
        return id.to_string();
    }
    let inner = id.trim_start_matches('{').trim_end_matches('}');
    format!("{{{}}}", inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn test_wrap_extension_id() {
        assert_eq!(wrap_extension_id("abc123"), "{abc123}");
        assert_eq!(wrap_extension_id("{abc123}"), "{abc123}");
        assert_eq!(wrap_extension_id("ext@example.com"), "ext@example.com");
    }

    #[test]
    fn test_jwt_is_short_lived_hs256() {
        #[derive(Debug, Deserialize)]
        struct Decoded {
            iss: String,
            jti: String,
            iat: i64,
            exp: i64,
        }

        let client = AddonsClient::new(Client::new(), "user:12345:67", "shh");
        let token = client.create_jwt().unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        let decoded = decode::<Decoded>(&token, &DecodingKey::from_secret(b"shh"), &validation)
            .unwrap()
            .claims;

        assert_eq!(decoded.iss, "user:12345:67");
        assert_eq!(decoded.exp - decoded.iat, JWT_LIFETIME_SECS);
        assert!(!decoded.jti.is_empty());
        assert_ne!(client.create_jwt().unwrap(), token);
    }

    #[test]
    fn test_upload_details_tolerate_unprocessed_payload() {
        let details: UploadDetails = serde_json::from_value(serde_json::json!({
            "uuid": "f1e2",
            "channel": "listed",
            "processed": false,
            "submitted": false,
            "url": "https://addons.mozilla.org/api/v5/addons/upload/f1e2/",
            "valid": false,
            "validation": null,
            "version": "1.0.0"
        }))
        .unwrap();

        assert!(!details.processed);
        assert_eq!(details.channel, Some(FirefoxChannel::Listed));
        assert_eq!(details.counts(), ValidationCounts::default());
    }

    #[test]
    fn test_addon_id_accepts_number_or_string() {
        let details: AddonDetails = serde_json::from_value(serde_json::json!({ "id": 42 })).unwrap();
        assert_eq!(details.id.to_string(), "42");
        let details: AddonDetails =
            serde_json::from_value(serde_json::json!({ "id": "{abc}" })).unwrap();
        assert_eq!(details.id, AddonId::Text("{abc}".to_string()));
    }
}
