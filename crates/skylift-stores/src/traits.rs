//! Store adapter traits

use std::path::Path;

use crate::error::{Result, StoreError};
use crate::status::StatusSink;
use crate::types::*;

/// Trait for browser extension store adapters
///
/// One adapter drives one store's full submission protocol. Adapters hold
/// their own options and credentials; the orchestrator only decides when
/// they run.
#[async_trait::async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Which store this adapter submits to
    fn store_id(&self) -> StoreId;

    /// Check that every local file the submission needs is present
    ///
    /// Runs before any network request.
    async fn ensure_artifacts_exist(&self) -> Result<()>;

    /// Run the submission protocol
    ///
    /// With `dry_run` set, adapters stop right after authenticating.
    async fn submit(&self, dry_run: bool) -> Result<()>;
}

/// Builds adapters for configured stores
///
/// Each adapter receives its own [`StatusSink`] so status text can be
/// attributed to the right store.
pub trait AdapterFactory: Send + Sync {
    /// Chrome Web Store adapter
    fn chrome(&self, options: &ChromeOptions, status: StatusSink) -> Box<dyn StoreAdapter>;

    /// Firefox Add-ons adapter
    fn firefox(&self, options: &FirefoxOptions, status: StatusSink) -> Box<dyn StoreAdapter>;

    /// Edge Add-ons adapter
    fn edge(&self, options: &EdgeOptions, status: StatusSink) -> Box<dyn StoreAdapter>;
}

/// Fail with [`StoreError::FileNotFound`] unless `path` exists
pub async fn ensure_zip_exists(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Reject deploy percentages outside 1..=100 before any request is made
pub fn validate_deploy_percentage(percentage: Option<u8>) -> Result<()> {
    match percentage {
        Some(p) if !(1..=100).contains(&p) => Err(StoreError::InvalidOptions(format!(
            "deploy percentage must be between 1 and 100, got {}",
            p
        ))),
        _ => Ok(()),
    }
}
