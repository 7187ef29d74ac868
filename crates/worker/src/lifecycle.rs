//! Lifecycle controller: the entry point a host wires its triggers to.
//!
//! - `setup`: preload the app shell, then allow the new version to take over
//!   without waiting for the previous one to drain.
//! - `version_switch`: delete namespaces of earlier versions, then claim all
//!   traffic.
//! - `intercept`: classify a GET request and answer it with the matching
//!   strategy. Other methods pass through untouched.

use std::sync::Arc;

use shellcache_client::{FetchConfig, Fetcher, HttpFetcher};
use shellcache_core::{AppConfig, CacheDb, CacheStore, Error, Request, Response, Url};

use crate::background::BackgroundWrites;
use crate::classify::classify;
use crate::namespacer::{Namespacer, current_tags};
use crate::populate::Populator;
use crate::strategy::{Executor, Strategy};

/// Completion signal reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Setup finished; the new version may activate immediately.
    SkipWaiting,
    /// Version switch finished; the new version may handle all traffic.
    Claim,
}

/// Result of intercepting a request.
#[derive(Debug)]
pub enum Interception {
    /// Answered by a caching strategy.
    Respond { strategy: Strategy, response: Response },
    /// Not handled here; the host sends the request to the network as is.
    Passthrough,
}

/// Ties the namespacer, populator and executor of one deployed version together.
#[derive(Clone)]
pub struct Controller {
    namespacer: Namespacer,
    populator: Populator,
    executor: Executor,
    fetcher: Arc<dyn Fetcher>,
    manifest: Arc<[String]>,
}

impl Controller {
    pub fn new(
        store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, version: impl Into<String>, origin: Url,
        manifest: Vec<String>,
    ) -> Self {
        let namespacer = Namespacer::new(store, version);
        let executor = Executor::new(namespacer.clone(), Arc::clone(&fetcher), origin.clone());
        let populator = Populator::new(namespacer.clone(), Arc::clone(&fetcher), origin);
        Self { namespacer, populator, executor, fetcher, manifest: manifest.into() }
    }

    /// Build a controller from configuration and explicit capabilities.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the configuration does not validate.
    pub fn from_config(config: &AppConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self::new(store, fetcher, config.version.clone(), origin, config.manifest.clone()))
    }

    /// Build a controller backed by the SQLite store at `config.db_path` and
    /// the reqwest fetcher.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        let store = CacheDb::open(&config.db_path).await?;
        let fetcher = HttpFetcher::new(FetchConfig::from(config))?;
        Self::from_config(config, Arc::new(store), Arc::new(fetcher))
    }

    pub fn version(&self) -> &str {
        self.namespacer.version()
    }

    pub fn namespacer(&self) -> &Namespacer {
        &self.namespacer
    }

    /// Preload the manifest into the static namespace.
    ///
    /// On failure the host must not consider setup finished and should retry
    /// it from scratch on the next load.
    pub async fn setup(&self) -> Result<Signal, Error> {
        let report = self.populator.populate(&self.manifest).await?;
        tracing::info!(version = self.version(), entries = report.entries, "setup complete");
        Ok(Signal::SkipWaiting)
    }

    /// Keep only the namespaces of `new_version` and delete the rest.
    pub async fn version_switch(&self, new_version: &str) -> Result<Signal, Error> {
        if new_version != self.version() {
            tracing::warn!(
                controller_version = self.version(),
                new_version,
                "version switch to a version this controller does not serve"
            );
        }

        let deleted = self.namespacer.prune_stale(&current_tags(new_version)).await?;
        tracing::info!(version = new_version, deleted = ?deleted, "version switch complete");
        Ok(Signal::Claim)
    }

    /// Answer a request from the cache strategies, or pass it through.
    ///
    /// Non-GET requests are neither looked up nor stored.
    pub async fn intercept(&self, request: &Request) -> Result<Interception, Error> {
        if !request.is_get() {
            tracing::debug!(method = %request.method, url = %request.url, "passing through");
            return Ok(Interception::Passthrough);
        }

        let class = classify(request);
        let strategy = class.strategy();
        tracing::debug!(url = %request.url, class = %class, strategy = %strategy, "intercepted");

        let response = self.executor.execute(strategy, request).await?;
        Ok(Interception::Respond { strategy, response })
    }

    /// Intercept, sending passed-through requests to the network unmodified.
    pub async fn handle(&self, request: &Request) -> Result<Response, Error> {
        match self.intercept(request).await? {
            Interception::Respond { response, .. } => Ok(response),
            Interception::Passthrough => self.fetcher.fetch(request).await,
        }
    }

    /// Background writes and revalidations spawned while intercepting.
    pub fn background(&self) -> &BackgroundWrites {
        self.executor.background()
    }

    /// Wait for background writes and revalidations to finish.
    pub async fn settle(&self) {
        self.executor.background().settle().await;
    }
}
