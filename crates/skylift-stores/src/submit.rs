//! Multi-store submission orchestrator
//!
//! Runs every configured store in its own task. A failure in one store is
//! recorded in that store's result and never cancels the others.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{Result, StoreError, SubmitError};
use crate::registry::StoreRegistry;
use crate::status::{SubmitEvent, SubmitReporter};
use crate::traits::{AdapterFactory, StoreAdapter};
use crate::types::{failure_count, SubmissionConfig, SubmitResults};

/// Submit to every store present in `config`
///
/// Fails with [`SubmitError::NoWork`] before building any adapter when no
/// store is configured. Otherwise always returns one result per attempted
/// store.
pub async fn submit(
    config: &SubmissionConfig,
    factory: &dyn AdapterFactory,
    reporter: Arc<dyn SubmitReporter>,
) -> std::result::Result<SubmitResults, SubmitError> {
    if config.is_empty() {
        return Err(SubmitError::NoWork);
    }

    let registry = StoreRegistry::from_config(config, factory, reporter.clone());
    Ok(run_all(&registry, config.dry_run, reporter).await)
}

/// Run every adapter in `registry` concurrently and collect the outcomes
pub async fn run_all(
    registry: &StoreRegistry,
    dry_run: bool,
    reporter: Arc<dyn SubmitReporter>,
) -> SubmitResults {
    let start = Instant::now();
    let mut handles = Vec::new();

    for store in registry.all() {
        let id = store.store_id();
        let store = store.clone();
        let reporter = reporter.clone();

        reporter.report(&SubmitEvent::Started { store: id });

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let result = run_store(store.as_ref(), dry_run).await;
            match &result {
                Ok(()) => reporter.report(&SubmitEvent::Succeeded {
                    store: id,
                    duration: started.elapsed(),
                }),
                Err(e) => reporter.report(&SubmitEvent::Failed {
                    store: id,
                    duration: started.elapsed(),
                    error: e.to_string(),
                }),
            }
            result
        });

        handles.push((id, handle));
    }

    let mut results = SubmitResults::new();
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                let error = StoreError::Other(format!("Submission task panicked: {}", e));
                reporter.report(&SubmitEvent::Failed {
                    store: id,
                    duration: start.elapsed(),
                    error: error.to_string(),
                });
                Err(error)
            }
        };
        debug!(store = %id, success = result.is_ok(), "store finished");
        results.insert(id, result.into());
    }

    let failed = failure_count(&results);
    reporter.report(&SubmitEvent::AllCompleted {
        total: results.len(),
        failed,
        duration: start.elapsed(),
    });
    info!(total = results.len(), failed, "submission run finished");

    results
}

/// Local file checks first, then the store protocol
async fn run_store(store: &dyn StoreAdapter, dry_run: bool) -> Result<()> {
    store.ensure_artifacts_exist().await?;
    store.submit(dry_run).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::ChromeWebStore;
    use crate::edge::EdgeAddonStore;
    use crate::firefox::FirefoxAddonStore;
    use crate::poll::PollOptions;
    use crate::status::{CollectingReporter, StatusSink};
    use crate::testing::*;
    use crate::types::*;
    use std::time::Duration;

    /// Factory handing out adapters over recording mocks
    #[derive(Default)]
    struct MockFactory {
        chrome_calls: CallLog,
        firefox_calls: CallLog,
        edge_calls: CallLog,
        built: CallLog,
        fail_chrome_auth: bool,
    }

    fn poll() -> PollOptions {
        PollOptions::new(Duration::from_millis(10), Duration::from_millis(50))
    }

    impl AdapterFactory for MockFactory {
        fn chrome(&self, options: &ChromeOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
            self.built.record("chrome", "");
            let api = MockCws {
                calls: self.chrome_calls.clone(),
                fail_auth: self.fail_chrome_auth,
                ..Default::default()
            };
            Box::new(ChromeWebStore::new(api, options.clone(), status, poll()))
        }

        fn firefox(&self, options: &FirefoxOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
            self.built.record("firefox", "");
            let api = MockAddons {
                calls: self.firefox_calls.clone(),
                ..Default::default()
            };
            Box::new(FirefoxAddonStore::new(api, options.clone(), status, poll()))
        }

        fn edge(&self, options: &EdgeOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
            self.built.record("edge", "");
            let api = MockEdge {
                calls: self.edge_calls.clone(),
                ..Default::default()
            };
            Box::new(EdgeAddonStore::new(api, options.clone(), status, poll()))
        }
    }

    fn all_stores(dir: &std::path::Path) -> SubmissionConfig {
        SubmissionConfig {
            chrome: Some(chrome_options(dir)),
            firefox: Some(firefox_options(dir)),
            edge: Some(edge_options(dir)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_all_stores_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory::default();

        let results = submit(
            &all_stores(dir.path()),
            &factory,
            Arc::new(CollectingReporter::default()),
        )
        .await
        .unwrap();

        assert_eq!(results.keys().copied().collect::<Vec<_>>(), StoreId::ALL.to_vec());
        assert!(results.values().all(|r| r.is_success()));
        assert_eq!(factory.chrome_calls.count("publish"), 1);
        assert_eq!(factory.firefox_calls.count("version_create"), 1);
        assert_eq!(factory.edge_calls.count("publish"), 1);
    }

    #[tokio::test]
    async fn test_failing_store_does_not_affect_others() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory {
            fail_chrome_auth: true,
            ..Default::default()
        };
        let config = SubmissionConfig {
            chrome: Some(chrome_options(dir.path())),
            firefox: Some(firefox_options(dir.path())),
            ..Default::default()
        };
        let reporter = Arc::new(CollectingReporter::default());

        let results = submit(&config, &factory, reporter.clone()).await.unwrap();

        assert!(matches!(
            results[&StoreId::Chrome].error(),
            Some(StoreError::AuthenticationFailed(_))
        ));
        assert!(results[&StoreId::Firefox].is_success());
        assert_eq!(failure_count(&results), 1);
        assert_eq!(factory.firefox_calls.count("version_create"), 1);

        let events = reporter.events();
        assert!(events.iter().any(|e| matches!(e, SubmitEvent::Failed { store: StoreId::Chrome, .. })));
        assert!(events.iter().any(|e| matches!(e, SubmitEvent::Succeeded { store: StoreId::Firefox, .. })));
        assert!(matches!(
            events.last(),
            Some(SubmitEvent::AllCompleted { total: 2, failed: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_no_stores_is_no_work() {
        let factory = MockFactory::default();

        let result = submit(
            &SubmissionConfig::default(),
            &factory,
            Arc::new(CollectingReporter::default()),
        )
        .await;

        assert!(matches!(result, Err(SubmitError::NoWork)));
        assert!(factory.built.names().is_empty());
    }

    #[tokio::test]
    async fn test_missing_zip_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory::default();
        let mut options = edge_options(dir.path());
        options.zip = dir.path().join("does-not-exist.zip");
        let config = SubmissionConfig {
            edge: Some(options),
            ..Default::default()
        };

        let results = submit(&config, &factory, Arc::new(CollectingReporter::default()))
            .await
            .unwrap();

        assert!(matches!(
            results[&StoreId::Edge].error(),
            Some(StoreError::FileNotFound(_))
        ));
        assert!(factory.edge_calls.names().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_only_authenticates() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory::default();
        let mut config = all_stores(dir.path());
        config.dry_run = true;

        let results = submit(&config, &factory, Arc::new(CollectingReporter::default()))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.values().all(|r| r.is_success()));
        assert_eq!(factory.chrome_calls.names(), vec!["get_token"]);
        assert_eq!(factory.firefox_calls.names(), vec!["details"]);
        assert_eq!(factory.edge_calls.names(), vec!["get_token"]);
    }

    #[tokio::test]
    async fn test_firefox_only_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory::default();
        let config = SubmissionConfig {
            firefox: Some(firefox_options(dir.path())),
            ..Default::default()
        };
        let reporter = Arc::new(CollectingReporter::default());

        let results = submit(&config, &factory, reporter.clone()).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[&StoreId::Firefox].is_success());
        assert!(!results.contains_key(&StoreId::Chrome));
        assert!(!results.contains_key(&StoreId::Edge));
        assert_eq!(factory.firefox_calls.count("upload_detail"), 1);
        assert!(!reporter.statuses(StoreId::Firefox).is_empty());
    }

    struct PanickingStore;

    #[async_trait::async_trait]
    impl StoreAdapter for PanickingStore {
        fn store_id(&self) -> StoreId {
            StoreId::Chrome
        }

        async fn ensure_artifacts_exist(&self) -> Result<()> {
            Ok(())
        }

        async fn submit(&self, _dry_run: bool) -> Result<()> {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_panicking_store_becomes_failure() {
        let mut registry = StoreRegistry::new();
        registry.register(Box::new(PanickingStore));

        let results = run_all(&registry, false, Arc::new(CollectingReporter::default())).await;

        match results[&StoreId::Chrome].error() {
            Some(StoreError::Other(message)) => assert!(message.contains("panicked")),
            other => panic!("expected panic failure, got {:?}", other),
        }
    }
}
