//! Namespaced key-value store of request → response snapshots.
//!
//! The [`CacheStore`] trait is the store capability consumed by the worker.
//! Two implementations are provided:
//!
//! - [`CacheDb`]: persistent SQLite store via tokio-rusqlite, WAL mode,
//!   automatic schema migrations
//! - [`MemoryStore`]: in-process store, used as a test double

pub mod connection;
pub mod entries;
pub mod key;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;

pub use crate::Error;
use crate::request::Response;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use memory::{MemoryStore, StoreStats};

/// Store capability: namespace-scoped key-value operations.
///
/// Writes are last-write-wins per `(namespace, key)`. Implementations must be
/// shareable across concurrently running requests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the namespace if it does not exist yet.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    /// Look a key up in one namespace.
    async fn lookup(&self, namespace: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Look a key up in every namespace, oldest namespace first.
    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any previous entry for the key.
    ///
    /// Fails with `InvalidInput` if the namespace was never opened or has
    /// been deleted.
    async fn put(&self, namespace: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Store several entries as one unit.
    async fn put_batch(&self, namespace: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    /// Names of all existing namespaces, in creation order.
    async fn namespace_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a namespace and all of its entries. Returns whether it existed.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error>;

    /// Keys stored in a namespace, in no particular order.
    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error>;
}

fn namespace_not_open(namespace: &str) -> Error {
    Error::InvalidInput(format!("namespace {namespace} is not open"))
}
