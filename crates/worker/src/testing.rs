//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shellcache_client::Fetcher;
use shellcache_core::store::{CacheStore, RequestKey};
use shellcache_core::{Error, MemoryStore, Request, Response, StatusCode, Url};
use tokio::sync::Semaphore;

pub(crate) const ORIGIN: &str = "http://localhost:8080";

/// Upper bound for anything a test expects to finish without the network.
pub(crate) const PROMPTLY: Duration = Duration::from_secs(1);

pub(crate) fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub(crate) fn get(path: &str) -> Request {
    Request::get(origin().join(path).unwrap())
}

/// Holds every caller until opened. Opening is permanent.
#[derive(Clone)]
pub(crate) struct Gate(Arc<Semaphore>);

impl Gate {
    fn new() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub(crate) fn open(&self) {
        self.0.close();
    }

    async fn pass(&self) {
        let _ = self.0.acquire().await;
    }
}

#[derive(Clone)]
struct Route {
    status: StatusCode,
    body: String,
    headers: Vec<(String, String)>,
}

/// Fetcher answering from a path → response table.
///
/// Unknown paths get a 404. While offline every call fails. After
/// [`StubFetcher::hold`] calls block until the returned gate opens.
#[derive(Default)]
pub(crate) struct StubFetcher {
    routes: Mutex<HashMap<String, Route>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<Gate>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, path: &str, status: u16, body: &str) -> Self {
        self.set_route(path, status, body);
        self
    }

    /// Add a response header to an existing route.
    pub(crate) fn header(self, path: &str, name: &str, value: &str) -> Self {
        let mut routes = self.routes.lock().unwrap();
        routes.get_mut(path).unwrap().headers.push((name.to_string(), value.to_string()));
        drop(routes);
        self
    }

    pub(crate) fn set_route(&self, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        let route = Route { status, body: body.to_string(), headers: Vec::new() };
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Block subsequent fetches until the returned gate is opened.
    pub(crate) fn hold(&self) -> Gate {
        let gate = Gate::new();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Wait until at least `n` fetches have started.
    pub(crate) async fn started(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::FetchFailed(format!("offline: {}", request.url)));
        }
        let route = self.routes.lock().unwrap().get(request.path()).cloned();
        let route = route.unwrap_or(Route { status: StatusCode::NOT_FOUND, body: String::new(), headers: Vec::new() });
        let response = route
            .headers
            .into_iter()
            .fold(Response::new(request.url.as_str(), route.status, route.body), |r, (name, value)| {
                r.with_header(name, value)
            });
        Ok(response)
    }
}

/// Memory store whose writes wait for a gate.
pub(crate) struct HeldStore {
    inner: Arc<MemoryStore>,
    gate: Gate,
}

impl HeldStore {
    pub(crate) fn new(inner: Arc<MemoryStore>) -> (Self, Gate) {
        let gate = Gate::new();
        (Self { inner, gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl CacheStore for HeldStore {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.inner.open(namespace).await
    }

    async fn lookup(&self, namespace: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.inner.lookup(namespace, key).await
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.inner.lookup_any(key).await
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.gate.pass().await;
        self.inner.put(namespace, key, response).await
    }

    async fn put_batch(&self, namespace: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.gate.pass().await;
        self.inner.put_batch(namespace, entries).await
    }

    async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        self.inner.namespace_names().await
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.delete_namespace(namespace).await
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.keys(namespace).await
    }
}
