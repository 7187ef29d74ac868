//! In-process store used as a test double.
//!
//! Keeps namespaces in creation order and counts lookups and writes so tests
//! can assert that a code path never touched the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::key::RequestKey;
use super::{CacheStore, namespace_not_open};
use crate::Error;
use crate::request::Response;

type Namespace = HashMap<RequestKey, Response>;

/// Operation counters of a [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub lookups: usize,
    pub writes: usize,
}

/// In-memory implementation of [`CacheStore`].
///
/// Cloning shares the same underlying namespaces.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    namespaces: Arc<RwLock<Vec<(String, Namespace)>>>,
    lookups: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats { lookups: self.lookups.load(Ordering::SeqCst), writes: self.writes.load(Ordering::SeqCst) }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        let mut namespaces = self.namespaces.write().await;
        if !namespaces.iter().any(|(name, _)| name == namespace) {
            namespaces.push((namespace.to_string(), Namespace::new()));
        }
        Ok(())
    }

    async fn lookup(&self, namespace: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .iter()
            .find(|(name, _)| name == namespace)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.iter().find_map(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.put_batch(namespace, &[(key.clone(), response.clone())]).await
    }

    async fn put_batch(&self, namespace: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let mut namespaces = self.namespaces.write().await;
        let (_, stored) = namespaces
            .iter_mut()
            .find(|(name, _)| name == namespace)
            .ok_or_else(|| namespace_not_open(namespace))?;
        for (key, response) in entries {
            stored.insert(key.clone(), response.clone());
        }
        self.writes.fetch_add(entries.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.namespaces.read().await.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        let mut namespaces = self.namespaces.write().await;
        let before = namespaces.len();
        namespaces.retain(|(name, _)| name != namespace);
        Ok(namespaces.len() != before)
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .iter()
            .find(|(name, _)| name == namespace)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}
