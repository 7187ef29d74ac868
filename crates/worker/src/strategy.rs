//! Caching strategies.
//!
//! ### Cache-first (static namespace)
//! - Hit: return the entry, the network is not contacted.
//! - Miss: fetch, store in the background, return the response.
//!
//! ### Network-first (runtime namespace)
//! - Fetch, store in the background, return the response.
//! - On a network failure fall back to the exact request in any namespace,
//!   then to the app shell document, then give up with the fetch error.
//!
//! ### Stale-while-revalidate (runtime namespace)
//! - Hit: return the entry and refresh it in the background.
//! - Miss: wait for the network.
//!
//! No strategy retries a failed fetch. Store errors are never turned into
//! fallbacks.

use std::fmt;
use std::sync::Arc;

use shellcache_client::{Fetcher, resolve_path};
use shellcache_core::store::RequestKey;
use shellcache_core::{Error, Request, Response, Url};

use crate::background::BackgroundWrites;
use crate::namespacer::{NamespaceHandle, NamespaceKind, Namespacer};

/// Path of the document served to navigations when offline.
pub const APP_SHELL_DOCUMENT: &str = "/index.html";

/// Caching algorithm applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    /// Namespace the strategy reads from and writes to.
    pub fn namespace(self) -> NamespaceKind {
        match self {
            Strategy::CacheFirst => NamespaceKind::Static,
            Strategy::NetworkFirst | Strategy::StaleWhileRevalidate => NamespaceKind::Runtime,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CacheFirst => write!(f, "cache-first"),
            Strategy::NetworkFirst => write!(f, "network-first"),
            Strategy::StaleWhileRevalidate => write!(f, "stale-while-revalidate"),
        }
    }
}

/// Runs strategies against namespaces handed out by a [`Namespacer`].
#[derive(Clone)]
pub struct Executor {
    namespacer: Namespacer,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    background: BackgroundWrites,
}

impl Executor {
    /// `origin` is where the app shell document lives, whatever host a
    /// navigation was aimed at.
    pub fn new(namespacer: Namespacer, fetcher: Arc<dyn Fetcher>, origin: Url) -> Self {
        Self { namespacer, fetcher, origin, background: BackgroundWrites::new() }
    }

    /// Background writes and revalidations spawned by this executor.
    pub fn background(&self) -> &BackgroundWrites {
        &self.background
    }

    pub async fn execute(&self, strategy: Strategy, request: &Request) -> Result<Response, Error> {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    pub async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        let cache = self.namespacer.open(Strategy::CacheFirst.namespace()).await?;

        if let Some(cached) = cache.lookup(request).await? {
            tracing::debug!(url = %request.url, namespace = cache.name(), "cache hit");
            return Ok(cached);
        }

        let response = self.fetcher.fetch(request).await?;
        self.store_in_background(cache, request, &response);
        Ok(response)
    }

    pub async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        let cache = self.namespacer.open(Strategy::NetworkFirst.namespace()).await?;

        let err = match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store_in_background(cache, request, &response);
                return Ok(response);
            }
            Err(e) if e.is_fetch_failure() => e,
            Err(e) => return Err(e),
        };

        if let Some(cached) = self.namespacer.lookup_any(request).await? {
            tracing::warn!(url = %request.url, error = %err, "network failed, serving cached entry");
            return Ok(cached);
        }

        // Only a non-http origin makes this fail; report the fetch error then.
        let Ok(shell_url) = resolve_path(&self.origin, APP_SHELL_DOCUMENT) else {
            return Err(err);
        };
        if let Some(shell) = self.namespacer.lookup_any_url(&shell_url).await? {
            tracing::warn!(url = %request.url, error = %err, "network failed, serving app shell");
            return Ok(shell);
        }

        Err(err)
    }

    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, Error> {
        let cache = self.namespacer.open(Strategy::StaleWhileRevalidate.namespace()).await?;

        match cache.lookup(request).await? {
            Some(cached) => {
                tracing::debug!(url = %request.url, namespace = cache.name(), "serving stale entry, revalidating");
                self.revalidate_in_background(cache, request.clone());
                Ok(cached)
            }
            None => {
                let response = self.fetcher.fetch(request).await?;
                self.store_in_background(cache, request, &response);
                Ok(response)
            }
        }
    }

    fn store_in_background(&self, cache: NamespaceHandle, request: &Request, response: &Response) {
        let Some(key) = RequestKey::for_request(request) else {
            return;
        };
        let response = response.clone();
        self.background.spawn("store", async move {
            if cache.put(&key, &response).await? {
                tracing::debug!(namespace = cache.name(), key = %key, "stored response");
            }
            Ok(())
        });
    }

    fn revalidate_in_background(&self, cache: NamespaceHandle, request: Request) {
        let Some(key) = RequestKey::for_request(&request) else {
            return;
        };
        let fetcher = Arc::clone(&self.fetcher);
        self.background.spawn("revalidate", async move {
            match fetcher.fetch(&request).await {
                Ok(fresh) => {
                    cache.put(&key, &fresh).await?;
                }
                Err(e) if e.is_fetch_failure() => {
                    tracing::debug!(url = %request.url, error = %e, "revalidation failed, keeping stale entry");
                }
                Err(e) => return Err(e),
            }
            Ok(())
        });
    }
}
