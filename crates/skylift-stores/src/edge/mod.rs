//! Microsoft Edge Add-ons integration
//!
//! The draft package upload answers with an operation ID. The adapter polls
//! that operation until it leaves `InProgress` and publishes the draft once
//! it succeeded.

mod api;

pub use api::{
    operation_id_from_headers, DraftOperation, EdgeApi, EdgeClient, EdgePublishRequest,
    OperationStatus,
};

use tracing::{info, instrument, warn};

use crate::error::{Result, StoreError};
use crate::poll::{poll_until, PollOptions};
use crate::status::StatusSink;
use crate::traits::{ensure_zip_exists, validate_deploy_percentage, StoreAdapter};
use crate::types::{AccessToken, EdgeAuth, EdgeOptions, StoreId};

/// Edge Add-ons adapter
pub struct EdgeAddonStore<A = EdgeClient> {
    api: A,
    options: EdgeOptions,
    status: StatusSink,
    poll: PollOptions,
}

impl<A: EdgeApi> EdgeAddonStore<A> {
    /// Create an adapter around an Edge Add-ons client
    pub fn new(api: A, options: EdgeOptions, status: StatusSink, poll: PollOptions) -> Self {
        Self {
            api,
            options,
            status,
            poll,
        }
    }

    async fn upload_and_wait(&self, token: &AccessToken) -> Result<()> {
        self.status.set("Uploading new ZIP file");
        let operation_id = self.api.upload_draft(token, &self.options.zip).await?;

        self.status.set("Waiting for validation results");
        let api = &self.api;
        let operation_id = operation_id.as_str();
        let operation = poll_until(&self.poll, "Edge package validation", move || async move {
            let operation = api.draft_operation(token, operation_id).await?;
            Ok(match operation.status {
                OperationStatus::InProgress => None,
                _ => Some(operation),
            })
        })
        .await?;

        if operation.status == OperationStatus::Failed {
            let payload = serde_json::to_string_pretty(&operation)?;
            return Err(StoreError::ValidationFailed(payload));
        }

        self.status.set("Extension is valid");
        Ok(())
    }
}

#[async_trait::async_trait]
impl<A: EdgeApi> StoreAdapter for EdgeAddonStore<A> {
    fn store_id(&self) -> StoreId {
        StoreId::Edge
    }

    async fn ensure_artifacts_exist(&self) -> Result<()> {
        ensure_zip_exists(&self.options.zip).await
    }

    #[instrument(skip(self), fields(store = "edge"))]
    async fn submit(&self, dry_run: bool) -> Result<()> {
        validate_deploy_percentage(self.options.deploy_percentage)?;

        self.status.set("Getting authorization token");
        let token = self.api.get_token().await?;

        if dry_run {
            if let EdgeAuth::ApiKey { .. } = self.options.auth {
                warn!("Edge API 1.1 keys cannot be verified without uploading");
                self.status
                    .set("DRY RUN: API key checked locally only, not verified with the store");
            }
            self.status.set("DRY RUN: Skipped upload and publishing");
            return Ok(());
        }

        self.upload_and_wait(&token).await?;

        if self.options.skip_submit_review {
            self.status.set("Skipping submission (skipSubmitReview=true)");
            return Ok(());
        }

        self.status.set("Submitting new version");
        self.api
            .publish(
                &token,
                &EdgePublishRequest {
                    notes: self.options.notes.clone(),
                    deploy_percentage: self.options.deploy_percentage,
                    skip_review: self.options.skip_review,
                },
            )
            .await?;

        info!("Edge submission complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{edge_options, MockEdge};
    use std::time::Duration;

    fn store(api: MockEdge, options: EdgeOptions) -> EdgeAddonStore<MockEdge> {
        EdgeAddonStore::new(
            api,
            options,
            StatusSink::noop(),
            PollOptions::new(Duration::from_millis(10), Duration::from_millis(50)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_operation_then_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge {
            in_progress_polls: 2,
            ..Default::default()
        };
        let calls = api.calls.clone();

        store(api, edge_options(dir.path())).submit(false).await.unwrap();

        assert_eq!(calls.count("get_token"), 1);
        assert_eq!(calls.count("upload_draft"), 1);
        assert_eq!(calls.count("draft_operation"), 3);
        assert_eq!(calls.count("publish"), 1);
        assert_eq!(calls.args("draft_operation"), vec!["op-1", "op-1", "op-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_operation_carries_payload() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge {
            final_status: OperationStatus::Failed,
            ..Default::default()
        };
        let calls = api.calls.clone();

        let result = store(api, edge_options(dir.path())).submit(false).await;

        match result {
            Err(StoreError::ValidationFailed(payload)) => {
                assert!(payload.contains("InvalidPackage"));
                assert!(payload.contains("manifest.json missing"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(calls.count("publish"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_stuck_in_progress_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge {
            in_progress_polls: u32::MAX,
            ..Default::default()
        };
        let calls = api.calls.clone();

        let result = store(api, edge_options(dir.path())).submit(false).await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
        assert_eq!(calls.count("publish"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_submit_review_stops_before_publish() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge::default();
        let calls = api.calls.clone();
        let mut options = edge_options(dir.path());
        options.skip_submit_review = true;

        store(api, options).submit(false).await.unwrap();

        assert_eq!(calls.names(), vec!["get_token", "upload_draft", "draft_operation"]);
    }

    #[tokio::test]
    async fn test_dry_run_only_gets_token() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge::default();
        let calls = api.calls.clone();

        store(api, edge_options(dir.path())).submit(true).await.unwrap();

        assert_eq!(calls.names(), vec!["get_token"]);
    }

    #[tokio::test]
    async fn test_publish_sends_rollout_options() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockEdge::default();
        let published = api.published.clone();
        let mut options = edge_options(dir.path());
        options.deploy_percentage = Some(20);
        options.notes = Some("Staged rollout".to_string());

        store(api, options).submit(false).await.unwrap();

        let requests = published.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![EdgePublishRequest {
                notes: Some("Staged rollout".to_string()),
                deploy_percentage: Some(20),
                skip_review: false,
            }]
        );
    }
}
