//! Chrome Web Store integration
//!
//! ## Protocol
//!
//! 1. Exchange the refresh token for an access token
//! 2. Optionally cancel a pending submission (API v2)
//! 3. Upload the ZIP, waiting for processing when the store answers `IN_PROGRESS`
//! 4. Submit for review unless `skip_submit_review` is set
//!
//! ## Usage
//!
//! ```ignore
//! use skylift_stores::chrome::{ChromeWebStore, CwsClient};
//!
//! let store = ChromeWebStore::new(CwsClient::new(http, (&options).into()), options, status, poll);
//! store.submit(false).await?;
//! ```

mod api;

pub use api::{
    consent_url, exchange_auth_code, AuthCodeTokens, CwsApi, CwsClient, CwsCredentials,
    PublishRequest, UploadState, UploadStatus,
};

use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::poll::{poll_until, PollOptions};
use crate::status::StatusSink;
use crate::traits::{ensure_zip_exists, validate_deploy_percentage, StoreAdapter};
use crate::types::{ChromeApiVersion, ChromeOptions, StoreId};

/// Chrome Web Store adapter
pub struct ChromeWebStore<A = CwsClient> {
    api: A,
    options: ChromeOptions,
    status: StatusSink,
    poll: PollOptions,
}

impl<A: CwsApi> ChromeWebStore<A> {
    /// Create an adapter around a Chrome Web Store client
    pub fn new(api: A, options: ChromeOptions, status: StatusSink, poll: PollOptions) -> Self {
        Self {
            api,
            options,
            status,
            poll,
        }
    }

    fn cancel_pending(&self) -> bool {
        matches!(
            self.options.api,
            ChromeApiVersion::V2 {
                cancel_pending: true,
                ..
            }
        )
    }

    fn check_upload(&self, upload: UploadStatus) -> Result<()> {
        match upload.state {
            UploadState::Succeeded => Ok(()),
            UploadState::Failed => {
                let detail = if upload.errors.is_empty() {
                    upload.raw.to_string()
                } else {
                    upload.errors.join("; ")
                };
                Err(StoreError::ValidationFailed(detail))
            }
            UploadState::NotFound => Err(StoreError::Protocol(format!(
                "Chrome Web Store has no upload for item {}",
                self.options.extension_id
            ))),
            UploadState::InProgress => Err(StoreError::Protocol(
                "upload still in progress after processing finished".to_string(),
            )),
            UploadState::Unknown(state) => Err(StoreError::Protocol(format!(
                "unexpected upload state {:?}: {}",
                state, upload.raw
            ))),
        }
    }
}

#[async_trait::async_trait]
impl<A: CwsApi> StoreAdapter for ChromeWebStore<A> {
    fn store_id(&self) -> StoreId {
        StoreId::Chrome
    }

    async fn ensure_artifacts_exist(&self) -> Result<()> {
        ensure_zip_exists(&self.options.zip).await
    }

    #[instrument(skip(self), fields(store = "chrome"))]
    async fn submit(&self, dry_run: bool) -> Result<()> {
        validate_deploy_percentage(self.options.deploy_percentage)?;

        self.status.set("Getting an access token");
        let token = self.api.get_token().await?;

        if dry_run {
            self.status.set("DRY RUN: Skipped upload and publishing");
            return Ok(());
        }

        if self.cancel_pending() {
            self.status.set("Cancelling pending submission");
            self.api.cancel_submission(&token).await?;
        }

        self.status.set("Uploading new ZIP file");
        let mut upload = self.api.upload_zip(&token, &self.options.zip).await?;

        if upload.state == UploadState::InProgress {
            self.status.set("Upload in progress, waiting for processing");
            let api = &self.api;
            let token = &token;
            upload = poll_until(&self.poll, "Chrome Web Store upload", move || async move {
                let status = api.fetch_status(token).await?;
                Ok(match status.state {
                    UploadState::InProgress => None,
                    _ => Some(status),
                })
            })
            .await?;
        }
        self.check_upload(upload)?;

        if self.options.skip_submit_review {
            self.status.set("Skipping submission (skipSubmitReview=true)");
            return Ok(());
        }

        self.status.set("Submitting for review");
        self.api
            .publish(
                &token,
                &PublishRequest {
                    deploy_percentage: self.options.deploy_percentage,
                    skip_review: self.options.skip_review,
                },
            )
            .await?;

        info!("Chrome Web Store submission complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chrome_options, MockCws};
    use std::time::Duration;

    fn store(api: MockCws, options: ChromeOptions) -> ChromeWebStore<MockCws> {
        ChromeWebStore::new(
            api,
            options,
            StatusSink::noop(),
            PollOptions::new(Duration::from_millis(10), Duration::from_millis(50)),
        )
    }

    #[tokio::test]
    async fn test_full_submission_calls_upload_then_publish() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws::default();
        let calls = api.calls.clone();
        let store = store(api, chrome_options(dir.path()));

        store.submit(false).await.unwrap();

        assert_eq!(calls.names(), vec!["get_token", "upload_zip", "publish"]);
    }

    #[tokio::test]
    async fn test_dry_run_only_gets_token() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws::default();
        let calls = api.calls.clone();
        let store = store(api, chrome_options(dir.path()));

        store.submit(true).await.unwrap();

        assert_eq!(calls.names(), vec!["get_token"]);
    }

    #[tokio::test]
    async fn test_skip_submit_review_stops_after_upload() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws::default();
        let calls = api.calls.clone();
        let mut options = chrome_options(dir.path());
        options.skip_submit_review = true;

        store(api, options).submit(false).await.unwrap();

        assert_eq!(calls.names(), vec!["get_token", "upload_zip"]);
    }

    #[tokio::test]
    async fn test_cancel_pending_runs_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws::default();
        let calls = api.calls.clone();
        let mut options = chrome_options(dir.path());
        if let ChromeApiVersion::V2 { cancel_pending, .. } = &mut options.api {
            *cancel_pending = true;
        }

        store(api, options).submit(false).await.unwrap();

        assert_eq!(
            calls.names(),
            vec!["get_token", "cancel_submission", "upload_zip", "publish"]
        );
    }

    #[tokio::test]
    async fn test_invalid_deploy_percentage_rejected_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws::default();
        let calls = api.calls.clone();
        let mut options = chrome_options(dir.path());
        options.deploy_percentage = Some(0);

        let result = store(api, options).submit(false).await;

        assert!(matches!(result, Err(StoreError::InvalidOptions(_))));
        assert!(calls.names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_progress_upload_is_polled_until_done() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws {
            upload_state: "IN_PROGRESS",
            in_progress_polls: 2,
            ..Default::default()
        };
        let calls = api.calls.clone();

        store(api, chrome_options(dir.path()))
            .submit(false)
            .await
            .unwrap();

        assert_eq!(calls.count("fetch_status"), 3);
        assert_eq!(calls.count("publish"), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws {
            upload_state: "FAILURE",
            ..Default::default()
        };
        let calls = api.calls.clone();

        let result = store(api, chrome_options(dir.path())).submit(false).await;

        match result {
            Err(StoreError::ValidationFailed(detail)) => assert!(detail.contains("Manifest")),
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(calls.count("publish"), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_stops_submission() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockCws {
            fail_auth: true,
            ..Default::default()
        };
        let calls = api.calls.clone();

        let result = store(api, chrome_options(dir.path())).submit(false).await;

        assert!(matches!(result, Err(StoreError::AuthenticationFailed(_))));
        assert_eq!(calls.names(), vec!["get_token"]);
    }
}
