//! App shell preloading into the static namespace.

use std::sync::Arc;

use futures_util::future::try_join_all;
use shellcache_client::{Fetcher, resolve_path};
use shellcache_core::store::RequestKey;
use shellcache_core::{Error, Request, Response, Url};

use crate::namespacer::{NamespaceKind, Namespacer};

/// Outcome of a successful population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateReport {
    pub namespace: String,
    pub entries: usize,
}

/// Fetches a manifest of paths and stores them as one unit.
#[derive(Clone)]
pub struct Populator {
    namespacer: Namespacer,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
}

impl Populator {
    pub fn new(namespacer: Namespacer, fetcher: Arc<dyn Fetcher>, origin: Url) -> Self {
        Self { namespacer, fetcher, origin }
    }

    /// Fetch every manifest path and insert the responses into the static
    /// namespace.
    ///
    /// Fails with `PopulateFailed` if any path cannot be resolved, any fetch
    /// fails, or any response is unsuccessful or not storable. In that case nothing
    /// from this call is written; entries from earlier runs are untouched.
    pub async fn populate(&self, manifest: &[String]) -> Result<PopulateReport, Error> {
        let cache = self.namespacer.open(NamespaceKind::Static).await?;

        let requests = manifest
            .iter()
            .map(|path| {
                resolve_path(&self.origin, path)
                    .map(Request::get)
                    .map_err(|e| Error::PopulateFailed { url: path.clone(), reason: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries = try_join_all(requests.iter().map(|request| self.fetch_entry(request))).await?;

        cache.put_all(&entries).await?;

        tracing::info!(namespace = cache.name(), entries = entries.len(), "populated app shell");

        Ok(PopulateReport { namespace: cache.name().to_string(), entries: entries.len() })
    }

    async fn fetch_entry(&self, request: &Request) -> Result<(RequestKey, Response), Error> {
        let url = request.url.to_string();
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| Error::PopulateFailed { url: url.clone(), reason: e.to_string() })?;

        if !response.is_success() {
            return Err(Error::PopulateFailed { url, reason: format!("status {}", response.status.as_u16()) });
        }
        if !response.is_storable() {
            return Err(Error::PopulateFailed { url, reason: "response is not storable".into() });
        }

        Ok((RequestKey::for_url(&request.url), response))
    }
}
