//! Offline caching worker for shellcache.
//!
//! Sits between an application's requests and the network:
//!
//! - [`namespacer`]: versioned static/runtime namespaces and pruning
//! - [`populate`]: app shell preloading at setup
//! - [`classify`]: request → navigation / asset / other
//! - [`strategy`]: cache-first, network-first, stale-while-revalidate
//! - [`lifecycle`]: setup, version switch and intercept triggers
//! - [`runtime`]: channel-driven event loop for hosts

pub mod background;
pub mod classify;
pub mod lifecycle;
pub mod namespacer;
pub mod populate;
pub mod runtime;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use background::BackgroundWrites;
pub use classify::{RequestClass, classify};
pub use lifecycle::{Controller, Interception, Signal};
pub use namespacer::{NamespaceHandle, NamespaceKind, NamespaceTag, Namespacer, current_tags};
pub use populate::{PopulateReport, Populator};
pub use runtime::{HostEvent, HostHandle, spawn};
pub use strategy::{Executor, Strategy};
