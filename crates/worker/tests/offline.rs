//! End-to-end: reqwest fetcher against a mock origin, SQLite store on disk.

use std::sync::Arc;
use std::time::Duration;

use shellcache_client::{FetchConfig, HttpFetcher};
use shellcache_core::{AppConfig, CacheDb, CacheStore, Error, Request, Url};
use shellcache_worker::{Controller, Signal};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn app_server() -> MockServer {
    let server = MockServer::start().await;
    serve(&server, "/", 200, "ROOT").await;
    serve(&server, "/index.html", 200, "SHELL").await;
    serve(&server, "/app.js", 200, "X").await;
    server
}

/// Make every request outlive the client timeout.
async fn go_offline(server: &MockServer) {
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(server)
        .await;
}

fn config(server: &MockServer, db_path: std::path::PathBuf, version: &str) -> AppConfig {
    AppConfig {
        version: version.into(),
        origin: server.uri(),
        db_path,
        manifest: vec!["/".into(), "/index.html".into()],
        timeout_ms: 300,
        ..Default::default()
    }
}

async fn controller(config: &AppConfig) -> Controller {
    let store = CacheDb::open(&config.db_path).await.unwrap();
    let fetcher = HttpFetcher::new(FetchConfig::from(config)).unwrap();
    Controller::from_config(config, Arc::new(store), Arc::new(fetcher)).unwrap()
}

fn get(origin: &Url, p: &str) -> Request {
    Request::get(origin.join(p).unwrap())
}

#[tokio::test]
async fn test_app_keeps_working_offline() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let server = app_server().await;
    let config = config(&server, dir.path().join("cache.sqlite"), "v1");
    let origin = config.origin_url().unwrap();
    let controller = controller(&config).await;

    assert_eq!(controller.setup().await.unwrap(), Signal::SkipWaiting);
    assert_eq!(controller.version_switch("v1").await.unwrap(), Signal::Claim);

    let js = controller.handle(&get(&origin, "/app.js")).await.unwrap();
    assert_eq!(js.body.as_ref(), b"X");
    controller.settle().await;

    go_offline(&server).await;

    let root = controller.handle(&get(&origin, "/")).await.unwrap();
    assert_eq!(root.body.as_ref(), b"ROOT");

    let page = controller.handle(&get(&origin, "/docs/page.html")).await.unwrap();
    assert_eq!(page.body.as_ref(), b"SHELL");

    let js = controller.handle(&get(&origin, "/app.js")).await.unwrap();
    assert_eq!(js.body.as_ref(), b"X");

    let feed = controller.handle(&get(&origin, "/api/feed")).await;
    assert!(matches!(feed, Err(ref e) if e.is_fetch_failure()));
}

#[tokio::test]
async fn test_upgrade_prunes_previous_version() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.sqlite");
    let server = app_server().await;

    let v1 = controller(&config(&server, db_path.clone(), "v1")).await;
    v1.setup().await.unwrap();
    v1.version_switch("v1").await.unwrap();
    v1.handle(&get(&Url::parse(&server.uri()).unwrap(), "/api/feed")).await.unwrap();
    v1.settle().await;

    let v2 = controller(&config(&server, db_path.clone(), "v2")).await;
    v2.setup().await.unwrap();
    v2.version_switch("v2").await.unwrap();

    let inspect = CacheDb::open(&db_path).await.unwrap();
    assert_eq!(inspect.namespace_names().await.unwrap(), vec!["static-v2"]);
    assert_eq!(inspect.keys("static-v2").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_setup_fails_when_manifest_entry_missing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    serve(&server, "/", 200, "ROOT").await;

    let mut config = config(&server, dir.path().join("cache.sqlite"), "v1");
    config.manifest = vec!["/".into(), "/missing.html".into()];
    let controller = controller(&config).await;

    let result = controller.setup().await;
    assert!(matches!(result, Err(Error::PopulateFailed { ref url, .. }) if url.ends_with("/missing.html")));
}
