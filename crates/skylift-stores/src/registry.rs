//! Store adapter registry

use std::sync::Arc;
use tracing::debug;

use crate::chrome::{ChromeWebStore, CwsClient};
use crate::edge::{EdgeAddonStore, EdgeClient};
use crate::error::Result;
use crate::firefox::{AddonsClient, FirefoxAddonStore};
use crate::http::build_client;
use crate::poll::PollOptions;
use crate::status::{StatusSink, SubmitReporter};
use crate::traits::{AdapterFactory, StoreAdapter};
use crate::types::*;

/// Builds adapters backed by the real store APIs
pub struct HttpAdapterFactory {
    client: reqwest::Client,
    poll: PollOptions,
}

impl HttpAdapterFactory {
    /// Create a factory sharing one HTTP client across all stores
    pub fn new(poll: PollOptions) -> Result<Self> {
        Ok(Self::with_client(build_client()?, poll))
    }

    /// Create a factory with a caller-provided HTTP client
    pub fn with_client(client: reqwest::Client, poll: PollOptions) -> Self {
        Self { client, poll }
    }
}

impl AdapterFactory for HttpAdapterFactory {
    fn chrome(&self, options: &ChromeOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
        let api = CwsClient::new(self.client.clone(), options.into());
        Box::new(ChromeWebStore::new(api, options.clone(), status, self.poll))
    }

    fn firefox(&self, options: &FirefoxOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
        let api = AddonsClient::from_options(self.client.clone(), options);
        Box::new(FirefoxAddonStore::new(api, options.clone(), status, self.poll))
    }

    fn edge(&self, options: &EdgeOptions, status: StatusSink) -> Box<dyn StoreAdapter> {
        let api = EdgeClient::new(self.client.clone(), options);
        Box::new(EdgeAddonStore::new(api, options.clone(), status, self.poll))
    }
}

/// Adapters selected for one submission run, in preference order
pub struct StoreRegistry {
    stores: Vec<Arc<dyn StoreAdapter>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { stores: Vec::new() }
    }

    /// Build one adapter per configured store
    ///
    /// Every adapter gets its own status sink forwarding to `reporter`.
    pub fn from_config(
        config: &SubmissionConfig,
        factory: &dyn AdapterFactory,
        reporter: Arc<dyn SubmitReporter>,
    ) -> Self {
        let mut registry = Self::new();
        let sink = |store| StatusSink::for_store(store, reporter.clone());

        if let Some(options) = &config.chrome {
            registry.register(factory.chrome(options, sink(StoreId::Chrome)));
        }
        if let Some(options) = &config.firefox {
            registry.register(factory.firefox(options, sink(StoreId::Firefox)));
        }
        if let Some(options) = &config.edge {
            registry.register(factory.edge(options, sink(StoreId::Edge)));
        }

        debug!(stores = ?registry.ids(), "Selected store adapters");
        registry
    }

    /// Register a store adapter
    pub fn register(&mut self, store: Box<dyn StoreAdapter>) {
        self.stores.push(Arc::from(store));
    }

    /// Get all registered store adapters
    pub fn all(&self) -> &[Arc<dyn StoreAdapter>] {
        &self.stores
    }

    /// Ids of all registered adapters, in registration order
    pub fn ids(&self) -> Vec<StoreId> {
        self.stores.iter().map(|s| s.store_id()).collect()
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
