//! Versioned namespaces over the store capability.
//!
//! The namespacer is the only component that creates or deletes namespaces.
//! Everything else reads and writes entries through a [`NamespaceHandle`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use shellcache_core::store::{CacheStore, RequestKey};
use shellcache_core::{Error, Request, Response, Url};

/// The two logical namespaces of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// Preloaded app shell and cache-first assets.
    Static,
    /// Entries written by network-first and stale-while-revalidate.
    Runtime,
}

impl NamespaceKind {
    pub const ALL: [NamespaceKind; 2] = [NamespaceKind::Static, NamespaceKind::Runtime];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Static => "static",
            NamespaceKind::Runtime => "runtime",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(kind, version)` identity of a namespace, stored as `"{kind}-{version}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceTag {
    pub kind: NamespaceKind,
    pub version: String,
}

impl NamespaceTag {
    pub fn new(kind: NamespaceKind, version: impl Into<String>) -> Self {
        Self { kind, version: version.into() }
    }

    /// Store name of this namespace.
    pub fn name(&self) -> String {
        format!("{}-{}", self.kind, self.version)
    }

    /// Parse a store name back into a tag.
    ///
    /// Returns `None` for names that were not produced by [`NamespaceTag::name`].
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, version) = name.split_once('-')?;
        let kind = NamespaceKind::ALL.into_iter().find(|k| k.as_str() == kind)?;
        (!version.is_empty()).then(|| Self::new(kind, version))
    }
}

impl fmt::Display for NamespaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.version)
    }
}

/// Tags that must survive a switch to `version`.
pub fn current_tags(version: &str) -> HashSet<NamespaceTag> {
    NamespaceKind::ALL.into_iter().map(|kind| NamespaceTag::new(kind, version)).collect()
}

/// Owner of the live namespaces for one deployed version.
#[derive(Clone)]
pub struct Namespacer {
    store: Arc<dyn CacheStore>,
    version: String,
}

impl Namespacer {
    pub fn new(store: Arc<dyn CacheStore>, version: impl Into<String>) -> Self {
        Self { store, version: version.into() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Tag of the current namespace of `kind`.
    pub fn tag(&self, kind: NamespaceKind) -> NamespaceTag {
        NamespaceTag::new(kind, self.version.clone())
    }

    /// Open the current namespace of `kind`, creating it if absent.
    pub async fn open(&self, kind: NamespaceKind) -> Result<NamespaceHandle, Error> {
        let name = self.tag(kind).name();
        self.store.open(&name).await?;
        Ok(NamespaceHandle { name, store: Arc::clone(&self.store) })
    }

    /// Delete every namespace whose name is not one of `current`.
    ///
    /// Names that do not parse as a tag are deleted too. Returns the deleted
    /// names; a second call with the same tags deletes nothing.
    pub async fn prune_stale(&self, current: &HashSet<NamespaceTag>) -> Result<Vec<String>, Error> {
        let keep: HashSet<String> = current.iter().map(NamespaceTag::name).collect();
        let mut deleted = Vec::new();

        for name in self.store.namespace_names().await? {
            if keep.contains(&name) {
                continue;
            }
            if self.store.delete_namespace(&name).await? {
                match NamespaceTag::parse(&name) {
                    Some(tag) => tracing::debug!(kind = %tag.kind, version = %tag.version, "deleted stale namespace"),
                    None => tracing::debug!(namespace = %name, "deleted foreign namespace"),
                }
                deleted.push(name);
            }
        }

        Ok(deleted)
    }

    /// Look the request up in every namespace, oldest first.
    ///
    /// Non-GET requests are never looked up.
    pub async fn lookup_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        match RequestKey::for_request(request) {
            Some(key) => self.store.lookup_any(&key).await,
            None => Ok(None),
        }
    }

    /// Look a GET of `url` up in every namespace, oldest first.
    pub async fn lookup_any_url(&self, url: &Url) -> Result<Option<Response>, Error> {
        self.store.lookup_any(&RequestKey::for_url(url)).await
    }
}

/// Read/write access to one open namespace.
#[derive(Clone)]
pub struct NamespaceHandle {
    name: String,
    store: Arc<dyn CacheStore>,
}

impl NamespaceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the entry for a request. Non-GET requests never match.
    pub async fn lookup(&self, request: &Request) -> Result<Option<Response>, Error> {
        match RequestKey::for_request(request) {
            Some(key) => self.store.lookup(&self.name, &key).await,
            None => Ok(None),
        }
    }

    /// Store a response under `key`, replacing any previous entry.
    ///
    /// Returns `false` without writing if the response is not storable.
    pub async fn put(&self, key: &RequestKey, response: &Response) -> Result<bool, Error> {
        if !response.is_storable() {
            tracing::debug!(namespace = %self.name, key = %key, status = response.status.as_u16(), "response not storable");
            return Ok(false);
        }
        self.store.put(&self.name, key, response).await?;
        Ok(true)
    }

    /// Store several entries as one unit. Callers check storability first.
    pub async fn put_all(&self, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.store.put_batch(&self.name, entries).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.store.keys(&self.name).await
    }

    pub async fn entry_count(&self) -> Result<usize, Error> {
        Ok(self.keys().await?.len())
    }
}
