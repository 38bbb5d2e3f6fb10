//! Recording mocks of the store clients

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::chrome::{CwsApi, PublishRequest, UploadStatus};
use crate::edge::{DraftOperation, EdgeApi, EdgePublishRequest, OperationStatus};
use crate::error::{Result, StoreError};
use crate::firefox::{AddonDetails, AddonId, AddonVersion, AddonsApi, UploadDetails, ValidationCounts, VersionFile};
use crate::types::*;

/// Ordered log of `(method, first argument)` calls, shared across clones
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(String, String)>>>);

impl CallLog {
    pub fn record(&self, name: &str, arg: impl Into<String>) {
        self.0.lock().unwrap().push((name.to_string(), arg.into()));
    }

    pub fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|(n, _)| n == name).count()
    }

    pub fn args(&self, name: &str) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, a)| a.clone())
            .collect()
    }
}

fn zip_in(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"PK\x03\x04").unwrap();
    path
}

pub fn chrome_options(dir: &Path) -> ChromeOptions {
    ChromeOptions {
        zip: zip_in(dir, "chrome.zip"),
        extension_id: "abcdefghijklmnop".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        refresh_token: "refresh-token".to_string(),
        api: ChromeApiVersion::V2 {
            publisher_id: "publisher".to_string(),
            publish_type: ChromePublishType::DefaultPublish,
            cancel_pending: false,
        },
        deploy_percentage: None,
        skip_review: false,
        skip_submit_review: false,
    }
}

pub fn firefox_options(dir: &Path) -> FirefoxOptions {
    FirefoxOptions {
        zip: zip_in(dir, "firefox.zip"),
        sources_zip: None,
        extension_id: "ext@example.com".to_string(),
        jwt_issuer: "user:1:2".to_string(),
        jwt_secret: "secret".to_string(),
        channel: FirefoxChannel::Listed,
    }
}

pub fn edge_options(dir: &Path) -> EdgeOptions {
    EdgeOptions {
        zip: zip_in(dir, "edge.zip"),
        product_id: "product".to_string(),
        client_id: "client".to_string(),
        auth: EdgeAuth::ApiKey {
            api_key: "api-key".to_string(),
        },
        skip_submit_review: false,
        deploy_percentage: None,
        skip_review: false,
        notes: None,
    }
}

fn token() -> AccessToken {
    AccessToken::bearer("token", Some(3600))
}

pub struct MockCws {
    pub calls: CallLog,
    pub upload_state: &'static str,
    pub in_progress_polls: u32,
    pub fail_auth: bool,
    pub polls: AtomicU32,
}

impl Default for MockCws {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            upload_state: "SUCCESS",
            in_progress_polls: 0,
            fail_auth: false,
            polls: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl CwsApi for MockCws {
    async fn get_token(&self) -> Result<AccessToken> {
        self.calls.record("get_token", "");
        if self.fail_auth {
            return Err(StoreError::AuthenticationFailed("400 - invalid_grant".to_string()));
        }
        Ok(token())
    }

    async fn cancel_submission(&self, _token: &AccessToken) -> Result<()> {
        self.calls.record("cancel_submission", "");
        Ok(())
    }

    async fn upload_zip(&self, _token: &AccessToken, zip: &Path) -> Result<UploadStatus> {
        self.calls.record("upload_zip", zip.display().to_string());
        Ok(UploadStatus::from_value(serde_json::json!({
            "uploadState": self.upload_state,
            "itemError": [{ "error_code": "PKG_INVALID", "error_detail": "Manifest is invalid" }]
        })))
    }

    async fn fetch_status(&self, _token: &AccessToken) -> Result<UploadStatus> {
        self.calls.record("fetch_status", "");
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        let state = if n < self.in_progress_polls {
            "IN_PROGRESS"
        } else {
            "SUCCEEDED"
        };
        Ok(UploadStatus::from_value(serde_json::json!({ "lastAsyncUploadState": state })))
    }

    async fn publish(&self, _token: &AccessToken, _request: &PublishRequest) -> Result<()> {
        self.calls.record("publish", "");
        Ok(())
    }

    async fn set_published_deploy_percentage(&self, _token: &AccessToken, percentage: u8) -> Result<()> {
        self.calls
            .record("set_published_deploy_percentage", percentage.to_string());
        Ok(())
    }
}

pub struct MockAddons {
    pub calls: CallLog,
    /// Unprocessed upload-detail responses before processing finishes
    pub processed_after: u32,
    pub valid: bool,
    pub fail_auth: bool,
    pub polls: AtomicU32,
}

impl Default for MockAddons {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            processed_after: 0,
            valid: true,
            fail_auth: false,
            polls: AtomicU32::new(0),
        }
    }
}

impl MockAddons {
    fn upload(&self, processed: bool) -> UploadDetails {
        UploadDetails {
            uuid: "upload-1".to_string(),
            channel: Some(FirefoxChannel::Listed),
            processed,
            submitted: false,
            url: None,
            valid: processed && self.valid,
            validation: processed.then_some(ValidationCounts {
                errors: if self.valid { 0 } else { 2 },
                warnings: 0,
                notices: 0,
            }),
            version: Some("1.0.0".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl AddonsApi for MockAddons {
    async fn details(&self, extension_id: &str) -> Result<AddonDetails> {
        self.calls.record("details", extension_id);
        if self.fail_auth {
            return Err(StoreError::ApiError {
                status: 401,
                message: "Incorrect authentication credentials.".to_string(),
            });
        }
        Ok(AddonDetails {
            id: AddonId::Numeric(42),
            guid: Some(extension_id.to_string()),
        })
    }

    async fn upload_create(&self, zip: &Path, channel: FirefoxChannel) -> Result<UploadDetails> {
        self.calls
            .record("upload_create", format!("{}:{}", channel.as_str(), zip.display()));
        Ok(self.upload(false))
    }

    async fn upload_detail(&self, uuid: &str) -> Result<UploadDetails> {
        self.calls.record("upload_detail", uuid);
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.upload(n >= self.processed_after))
    }

    async fn version_create(
        &self,
        extension_id: &str,
        _upload_uuid: &str,
        _source: Option<&Path>,
    ) -> Result<AddonVersion> {
        self.calls.record("version_create", extension_id);
        Ok(AddonVersion {
            id: 7,
            file: Some(VersionFile { id: 99 }),
        })
    }
}

pub struct MockEdge {
    pub calls: CallLog,
    pub in_progress_polls: u32,
    pub final_status: OperationStatus,
    pub fail_auth: bool,
    pub published: Arc<Mutex<Vec<EdgePublishRequest>>>,
    pub polls: AtomicU32,
}

impl Default for MockEdge {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            in_progress_polls: 0,
            final_status: OperationStatus::Succeeded,
            fail_auth: false,
            published: Arc::default(),
            polls: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl EdgeApi for MockEdge {
    async fn get_token(&self) -> Result<AccessToken> {
        self.calls.record("get_token", "");
        if self.fail_auth {
            return Err(StoreError::AuthenticationFailed("401 - unauthorized_client".to_string()));
        }
        Ok(token())
    }

    async fn upload_draft(&self, _token: &AccessToken, zip: &Path) -> Result<String> {
        self.calls.record("upload_draft", zip.display().to_string());
        Ok("op-1".to_string())
    }

    async fn draft_operation(&self, _token: &AccessToken, operation_id: &str) -> Result<DraftOperation> {
        self.calls.record("draft_operation", operation_id);
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        let status = if n < self.in_progress_polls {
            OperationStatus::InProgress
        } else {
            self.final_status
        };
        let failed = status == OperationStatus::Failed;
        Ok(DraftOperation {
            id: Some(operation_id.to_string()),
            created_time: None,
            last_updated_time: None,
            status,
            message: failed.then(|| "Package is invalid".to_string()),
            error_code: failed.then(|| "InvalidPackage".to_string()),
            errors: failed.then(|| vec![serde_json::json!({ "message": "manifest.json missing" })]),
        })
    }

    async fn publish(&self, _token: &AccessToken, request: &EdgePublishRequest) -> Result<()> {
        self.calls.record("publish", "");
        self.published.lock().unwrap().push(request.clone());
        Ok(())
    }
}
