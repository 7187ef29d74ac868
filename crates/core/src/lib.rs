//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - The request/response snapshot model
//! - The namespaced store capability with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod request;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Request, Response};
pub use store::{CacheDb, CacheStore, MemoryStore, RequestKey};

pub use http::{Method, StatusCode};
pub use url::Url;
