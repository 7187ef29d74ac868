//! Resolution of manifest and fallback paths against an origin.

/// Error type for path resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty path")]
    Empty,

    #[error("path must start with '/': {0}")]
    NotAbsolutePath(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve an absolute path (e.g. `/index.html`) against the origin of `base`.
///
/// Any path, query or fragment of `base` is ignored. Whitespace around
/// `path` is trimmed; its own query string is kept.
pub fn resolve_path(base: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    if !trimmed.starts_with('/') || trimmed.starts_with("//") {
        return Err(UrlError::NotAbsolutePath(trimmed.to_string()));
    }

    match base.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    let mut resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    resolved.set_fragment(None);

    Ok(resolved)
}
