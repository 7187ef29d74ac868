//! Host event loop.
//!
//! Hosts deliver their lifecycle triggers as [`HostEvent`]s over a channel.
//! Setup and version switches run inline, one at a time, and always run to
//! completion. Each fetch runs on its own task so requests progress
//! independently; a fetch whose requester has gone away is abandoned.
//!
//! The loop stops on [`HostEvent::Shutdown`] or when every handle is dropped.
//! Either way, fetches already in flight finish first, then the background
//! writes they spawned.

use shellcache_core::{Error, Request, Response};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::lifecycle::{Controller, Signal};

/// Capacity of the event channel.
const EVENT_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, Error>>;

/// A trigger delivered by the host.
#[derive(Debug)]
pub enum HostEvent {
    Setup { reply: Reply<Signal> },
    VersionSwitch { version: String, reply: Reply<Signal> },
    Fetch { request: Request, reply: Reply<Response> },
    /// Finish in-flight fetches, drain background work and stop the loop.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Sending side of a running event loop.
#[derive(Clone, Debug)]
pub struct HostHandle {
    events: mpsc::Sender<HostEvent>,
}

impl HostHandle {
    pub async fn setup(&self) -> Result<Signal, Error> {
        self.call(|reply| HostEvent::Setup { reply }).await
    }

    pub async fn version_switch(&self, version: impl Into<String>) -> Result<Signal, Error> {
        let version = version.into();
        self.call(|reply| HostEvent::VersionSwitch { version, reply }).await
    }

    /// Intercept a request. Dropping the returned future abandons it.
    pub async fn fetch(&self, request: Request) -> Result<Response, Error> {
        self.call(|reply| HostEvent::Fetch { request, reply }).await
    }

    /// Stop the loop once in-flight fetches and their background work have
    /// finished.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let (reply, done) = oneshot::channel();
        self.events
            .send(HostEvent::Shutdown { reply })
            .await
            .map_err(|_| Error::HostClosed)?;
        done.await.map_err(|_| Error::HostClosed)
    }

    async fn call<T>(&self, event: impl FnOnce(Reply<T>) -> HostEvent) -> Result<T, Error> {
        let (reply, result) = oneshot::channel();
        self.events.send(event(reply)).await.map_err(|_| Error::HostClosed)?;
        result.await.map_err(|_| Error::HostClosed)?
    }
}

/// Start the event loop for `controller` on the current runtime.
pub fn spawn(controller: Controller) -> (HostHandle, JoinHandle<()>) {
    let (events, rx) = mpsc::channel(EVENT_BUFFER);
    let task = tokio::spawn(run(controller, rx));
    (HostHandle { events }, task)
}

async fn run(controller: Controller, mut events: mpsc::Receiver<HostEvent>) {
    tracing::debug!(version = controller.version(), "host event loop started");
    let mut in_flight = JoinSet::new();

    let shutdown = loop {
        let Some(event) = events.recv().await else {
            break None;
        };
        match event {
            HostEvent::Setup { reply } => {
                let _ = reply.send(controller.setup().await);
            }
            HostEvent::VersionSwitch { version, reply } => {
                let _ = reply.send(controller.version_switch(&version).await);
            }
            HostEvent::Fetch { request, reply } => {
                while in_flight.try_join_next().is_some() {}
                in_flight.spawn(respond(controller.clone(), request, reply));
            }
            HostEvent::Shutdown { reply } => break Some(reply),
        }
    };

    tracing::debug!(
        fetches = in_flight.len(),
        background = controller.background().pending(),
        "host event loop draining"
    );
    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished
            && e.is_panic()
        {
            tracing::error!(error = %e, "fetch task panicked");
        }
    }
    controller.settle().await;

    if let Some(reply) = shutdown {
        let _ = reply.send(());
    }
    tracing::debug!(version = controller.version(), "host event loop stopped");
}

async fn respond(controller: Controller, request: Request, mut reply: Reply<Response>) {
    let result = tokio::select! {
        result = controller.handle(&request) => Some(result),
        _ = reply.closed() => None,
    };

    match result {
        Some(result) => {
            let _ = reply.send(result);
        }
        None => tracing::debug!(url = %request.url, "requester went away, abandoning fetch"),
    }
}
