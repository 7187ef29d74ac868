//! Client code for shellcache.
//!
//! This crate provides the fetch capability (a trait plus its reqwest
//! implementation) and origin-relative path resolution used by the worker.

pub mod fetch;

pub use fetch::{FetchConfig, Fetcher, HttpFetcher, UrlError, resolve_path};
