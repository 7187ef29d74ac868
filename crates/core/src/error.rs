//! Unified error types for shellcache.
//!
//! Every message carries a stable code prefix so hosts can match on it
//! without depending on the enum layout.

use tokio_rusqlite::rusqlite;

/// Unified error types for the caching intermediary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input from the caller (e.g., a malformed manifest path).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network attempt failed before a response was produced.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A manifest entry could not be preloaded.
    #[error("POPULATE_FAILED: {url}: {reason}")]
    PopulateFailed { url: String, reason: String },

    /// Database operation failed.
    #[error("STORE_UNAVAILABLE: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_UNAVAILABLE: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded.
    #[error("STORE_UNAVAILABLE: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The host event loop is no longer running.
    #[error("HOST_CLOSED")]
    HostClosed,
}

impl Error {
    /// Whether this error came from a network attempt.
    ///
    /// Strategies fall back to cached entries only for these; store failures
    /// always propagate.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::FetchFailed(_) | Error::FetchTooLarge(_) | Error::InvalidUrl(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}
