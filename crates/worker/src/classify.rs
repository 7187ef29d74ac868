//! Request classification.
//!
//! Maps a GET request to the class that decides its caching strategy.
//! Rules are checked in order; navigation wins over asset.

use std::fmt;

use shellcache_core::{Destination, Request};

use crate::strategy::Strategy;

/// Path extensions served cache-first. Matching is case-sensitive.
pub const ASSET_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp", "js", "css"];

/// Classification of an intercepted GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Page loads and HTML documents.
    Navigation,
    /// Static sub-resources: styles, scripts, images, fonts.
    Asset,
    Other,
}

impl RequestClass {
    /// Strategy used for requests of this class.
    pub fn strategy(self) -> Strategy {
        match self {
            RequestClass::Navigation => Strategy::NetworkFirst,
            RequestClass::Asset => Strategy::CacheFirst,
            RequestClass::Other => Strategy::StaleWhileRevalidate,
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestClass::Navigation => write!(f, "navigation"),
            RequestClass::Asset => write!(f, "asset"),
            RequestClass::Other => write!(f, "other"),
        }
    }
}

/// Classify a request by destination hint and path.
///
/// Callers must only pass GET requests; everything else bypasses the cache.
pub fn classify(request: &Request) -> RequestClass {
    let path = request.path();

    if request.destination == Destination::Document || path == "/" || path.ends_with(".html") {
        return RequestClass::Navigation;
    }

    if request.destination.is_static_asset() || has_asset_extension(path) {
        return RequestClass::Asset;
    }

    RequestClass::Other
}

fn has_asset_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ASSET_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::get;

    #[test]
    fn test_root_is_navigation() {
        assert_eq!(classify(&get("/")), RequestClass::Navigation);
    }

    #[test]
    fn test_html_is_navigation() {
        assert_eq!(classify(&get("/index.html")), RequestClass::Navigation);
        assert_eq!(classify(&get("/docs/guide.html?ref=nav")), RequestClass::Navigation);
    }

    #[test]
    fn test_document_destination_is_navigation() {
        let request = get("/notes/42").with_destination(Destination::Document);
        assert_eq!(classify(&request), RequestClass::Navigation);
    }

    #[test]
    fn test_navigation_checked_before_asset() {
        let request = get("/").with_destination(Destination::Script);
        assert_eq!(classify(&request), RequestClass::Navigation);

        let request = get("/app.js").with_destination(Destination::Document);
        assert_eq!(classify(&request), RequestClass::Navigation);
    }

    #[test]
    fn test_asset_extensions() {
        for path in ["/app.js", "/styles/main.css", "/assets/icons/icon.svg", "/a.png", "/b.jpeg", "/c.webp"] {
            assert_eq!(classify(&get(path)), RequestClass::Asset, "{path}");
        }
    }

    #[test]
    fn test_asset_destinations() {
        for destination in [Destination::Style, Destination::Script, Destination::Image, Destination::Font] {
            let request = get("/api/avatar").with_destination(destination);
            assert_eq!(classify(&request), RequestClass::Asset);
        }
    }

    #[test]
    fn test_extension_matching_is_exact() {
        assert_eq!(classify(&get("/APP.JS")), RequestClass::Other);
        assert_eq!(classify(&get("/bundle.js.map")), RequestClass::Other);
        assert_eq!(classify(&get("/v1.2/data")), RequestClass::Other);
        assert_eq!(classify(&get("/page.htm")), RequestClass::Other);
    }

    #[test]
    fn test_other() {
        assert_eq!(classify(&get("/manifest.webmanifest")), RequestClass::Other);
        let request = get("/api/notes").with_destination(Destination::Other("manifest".into()));
        assert_eq!(classify(&request), RequestClass::Other);
    }

    #[test]
    fn test_class_strategy() {
        assert_eq!(RequestClass::Navigation.strategy(), Strategy::NetworkFirst);
        assert_eq!(RequestClass::Asset.strategy(), Strategy::CacheFirst);
        assert_eq!(RequestClass::Other.strategy(), Strategy::StaleWhileRevalidate);
    }
}
