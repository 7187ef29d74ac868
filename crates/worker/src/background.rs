//! Tracking for cache work that outlives the response it belongs to.
//!
//! Strategies return their response before the store write (or the
//! stale-while-revalidate refresh) has finished. That work is spawned here so
//! failures are logged instead of lost, and so a host can wait for it.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use shellcache_core::Error;
use tokio::task::JoinSet;

/// Set of spawned background cache tasks.
///
/// Cloning shares the same set. Dropping the last clone aborts whatever is
/// still running.
#[derive(Clone, Default)]
pub struct BackgroundWrites {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `work` on the current runtime. An error is logged and dropped.
    pub fn spawn<F>(&self, label: &'static str, work: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(finished) = tasks.try_join_next() {
            log_join_error(finished);
        }
        tasks.spawn(async move {
            if let Err(e) = work.await {
                tracing::warn!(task = label, error = %e, "background cache work failed");
            }
        });
    }

    /// Number of tasks spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Wait until every spawned task, including ones spawned meanwhile, is done.
    pub async fn settle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if tasks.is_empty() {
                return;
            }
            while let Some(finished) = tasks.join_next().await {
                log_join_error(finished);
            }
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result
        && e.is_panic()
    {
        tracing::error!(error = %e, "background cache task panicked");
    }
}
