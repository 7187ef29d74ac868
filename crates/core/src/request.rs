//! Request and response snapshots exchanged with the fetch and store
//! capabilities.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use http::{Method, StatusCode};
use url::Url;

/// Declared destination of a request, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Destination {
    /// Top-level page navigation.
    Document,
    Style,
    Script,
    Image,
    Font,
    /// Any other non-empty destination (e.g. `manifest`, `audio`).
    Other(String),
    /// No destination hint (e.g. `fetch()` from application code).
    #[default]
    None,
}

impl Destination {
    /// Whether the destination denotes a static sub-resource.
    pub fn is_static_asset(&self) -> bool {
        matches!(self, Destination::Style | Destination::Script | Destination::Image | Destination::Font)
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" => Destination::None,
            "document" => Destination::Document,
            "style" => Destination::Style,
            "script" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            other => Destination::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Document => write!(f, "document"),
            Destination::Style => write!(f, "style"),
            Destination::Script => write!(f, "script"),
            Destination::Image => write!(f, "image"),
            Destination::Font => write!(f, "font"),
            Destination::Other(s) => write!(f, "{s}"),
            Destination::None => Ok(()),
        }
    }
}

/// An outbound request intercepted from the host application.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request with the given method and no headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, destination: Destination::None, headers: Vec::new(), body: None }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// URL path component, always starting with `/`.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// A response snapshot, either fresh from the network or read from a store.
///
/// Cloning is cheap: the body is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL the response was ultimately served from.
    pub url: String,
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    /// Shorthand for a `200 OK` response.
    pub fn ok(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(url, StatusCode::OK, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether a store is allowed to keep this response.
    ///
    /// Partial content and `Vary: *` responses are never stored.
    pub fn is_storable(&self) -> bool {
        self.status != StatusCode::PARTIAL_CONTENT && self.header("vary").is_none_or(|v| v.trim() != "*")
    }
}
