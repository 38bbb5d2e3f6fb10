//! Firefox Add-ons integration
//!
//! Uploads are validated asynchronously by addons.mozilla.org. The adapter
//! polls the upload until it is processed, reports the validation counts,
//! and only creates a new version when the upload is valid.

mod api;

pub use api::{
    wrap_extension_id, AddonDetails, AddonId, AddonVersion, AddonsApi, AddonsClient,
    UploadDetails, ValidationCounts, VersionFile,
};

use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::poll::{poll_until, PollOptions};
use crate::status::StatusSink;
use crate::traits::{ensure_zip_exists, StoreAdapter};
use crate::types::{FirefoxOptions, StoreId};

const DEVELOPER_HUB_URL: &str = "https://addons.mozilla.org/en-US/developers";

/// Developer hub page with the validation report of an upload
pub fn upload_validation_url(uuid: &str) -> String {
    format!("{}/upload/{}", DEVELOPER_HUB_URL, uuid)
}

fn plural(count: u32, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn summarize(counts: ValidationCounts) -> String {
    format!(
        "{}, {}, {}",
        plural(counts.errors, "error"),
        plural(counts.warnings, "warning"),
        plural(counts.notices, "notice")
    )
}

/// Firefox Add-ons adapter
pub struct FirefoxAddonStore<A = AddonsClient> {
    api: A,
    options: FirefoxOptions,
    status: StatusSink,
    poll: PollOptions,
}

impl<A: AddonsApi> FirefoxAddonStore<A> {
    /// Create an adapter around an Add-ons client
    pub fn new(api: A, options: FirefoxOptions, status: StatusSink, poll: PollOptions) -> Self {
        Self {
            api,
            options,
            status,
            poll,
        }
    }

    async fn upload_and_wait(&self) -> Result<UploadDetails> {
        self.status.set("Uploading new ZIP file");
        let upload = self
            .api
            .upload_create(&self.options.zip, self.options.channel)
            .await?;

        self.status.set("Waiting for validation results");
        if upload.processed {
            return Ok(upload);
        }

        let api = &self.api;
        let uuid = upload.uuid.as_str();
        poll_until(&self.poll, "Firefox upload validation", move || async move {
            let details = api.upload_detail(uuid).await?;
            Ok(details.processed.then_some(details))
        })
        .await
    }
}

#[async_trait::async_trait]
impl<A: AddonsApi> StoreAdapter for FirefoxAddonStore<A> {
    fn store_id(&self) -> StoreId {
        StoreId::Firefox
    }

    async fn ensure_artifacts_exist(&self) -> Result<()> {
        ensure_zip_exists(&self.options.zip).await?;
        if let Some(sources) = &self.options.sources_zip {
            ensure_zip_exists(sources).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(store = "firefox"))]
    async fn submit(&self, dry_run: bool) -> Result<()> {
        let extension_id = wrap_extension_id(&self.options.extension_id);

        self.status.set("Getting addon details");
        let addon = self.api.details(&extension_id).await?;

        if dry_run {
            self.status.set("DRY RUN: Skipped upload and publishing");
            return Ok(());
        }

        let upload = self.upload_and_wait().await?;
        let summary = summarize(upload.counts());
        self.status.set(format!("Validation results: {}", summary));

        if !upload.valid {
            return Err(StoreError::ValidationFailed(format!(
                "Extension is invalid ({}): {}",
                summary,
                upload_validation_url(&upload.uuid)
            )));
        }

        self.status.set("Submitting new version");
        let version = self
            .api
            .version_create(
                &extension_id,
                &upload.uuid,
                self.options.sources_zip.as_deref(),
            )
            .await?;

        if let Some(file) = version.file {
            self.status.set(format!(
                "Validation report: {}/addon/{}/file/{}/validation",
                DEVELOPER_HUB_URL, addon.id, file.id
            ));
        }
        info!(version_id = version.id, "Firefox version created");
        Ok(())
    }
}
