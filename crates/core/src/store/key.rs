//! Request keys for stored entries.

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

use crate::request::Request;

/// Normalized `(GET, URL)` identity of a stored entry.
///
/// Only constructible for GET requests, so every stored entry is keyed by
/// a GET. The fragment is dropped; the query string is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    url: String,
}

impl RequestKey {
    pub const METHOD: &'static str = "GET";

    /// Key for a request, or `None` if the request is not a GET.
    pub fn for_request(request: &Request) -> Option<Self> {
        request.is_get().then(|| Self::for_url(&request.url))
    }

    /// Key for a GET of `url`.
    pub fn for_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content-addressed digest used as the storage key.
    pub fn digest(&self) -> String {
        compute_key_digest(Self::METHOD, &self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Self::METHOD, self.url)
    }
}

/// Compute the SHA-256 storage digest for a method and normalized URL.
pub fn compute_key_digest(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
