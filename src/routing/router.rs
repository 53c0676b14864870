//! Route lookup over a compiled manifest.
//!
//! # Responsibilities
//! - Store the compiled route tables
//! - Look up the first matching route per table
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) regex scan per table (acceptable for typical route counts)
//! - Explicit `None` rather than silent default

use std::fmt;

use crate::manifest::{Manifest, Route};

/// Which manifest table a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Redirect,
    Rewrite,
    Html,
    Api,
    NotFound,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Redirect => "redirect",
            RouteKind::Rewrite => "rewrite",
            RouteKind::Html => "html",
            RouteKind::Api => "api",
            RouteKind::NotFound => "not_found",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route lookup over an immutable manifest.
#[derive(Debug, Default)]
pub struct ManifestRouter {
    manifest: Manifest,
}

fn first_match<'a>(routes: &'a [Route], pathname: &str) -> Option<&'a Route> {
    routes.iter().find(|route| route.is_match(pathname))
}

impl ManifestRouter {
    pub fn new(manifest: Manifest) -> Self {
        tracing::debug!(routes = manifest.route_count(), "Router built");
        Self { manifest }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// First redirect whose pattern and method list accept the request.
    pub fn find_redirect(&self, pathname: &str, method: &str) -> Option<&Route> {
        self.manifest
            .redirects
            .as_deref()?
            .iter()
            .find(|r| r.is_match(pathname) && r.allows_method(method))
    }

    /// First rewrite whose pattern and method list accept the request.
    pub fn find_rewrite(&self, pathname: &str, method: &str) -> Option<&Route> {
        self.manifest
            .rewrites
            .as_deref()?
            .iter()
            .find(|r| r.is_match(pathname) && r.allows_method(method))
    }

    pub fn find_html(&self, pathname: &str) -> Option<&Route> {
        first_match(&self.manifest.html_routes, pathname)
    }

    pub fn find_api(&self, pathname: &str) -> Option<&Route> {
        first_match(&self.manifest.api_routes, pathname)
    }

    pub fn find_not_found(&self, pathname: &str) -> Option<&Route> {
        first_match(&self.manifest.not_found_routes, pathname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{init_manifest_regexp, RawManifest};

    fn router() -> ManifestRouter {
        let raw = RawManifest::from_json(
            r#"{
                "htmlRoutes": [
                    { "namedRegex": "^/(?:/)?$", "routeKeys": {}, "page": "/index" },
                    { "namedRegex": "^/about(?:/)?$", "routeKeys": {}, "page": "/about" },
                    { "namedRegex": "^/(?<slug>[^/]+?)(?:/)?$", "routeKeys": { "slug": "slug" }, "page": "/[slug]" }
                ],
                "apiRoutes": [
                    { "namedRegex": "^/api/hello(?:/)?$", "routeKeys": {}, "page": "/api/hello" }
                ],
                "notFoundRoutes": [
                    { "namedRegex": "^(?:/(?<notFound>.+))?(?:/)?$", "routeKeys": { "notFound": "not-found" }, "page": "/+not-found" }
                ],
                "redirects": [
                    { "namedRegex": "^/old(?:/)?$", "routeKeys": {}, "page": "/about", "methods": ["GET"] }
                ],
                "rewrites": [
                    { "namedRegex": "^/alias(?:/)?$", "routeKeys": {}, "page": "/about" }
                ]
            }"#,
        )
        .unwrap();
        ManifestRouter::new(init_manifest_regexp(&raw).unwrap())
    }

    #[test]
    fn test_first_match_wins() {
        let router = router();
        assert_eq!(router.find_html("/about").unwrap().page, "/about");
        assert_eq!(router.find_html("/other").unwrap().page, "/[slug]");
        assert_eq!(router.find_html("/").unwrap().page, "/index");
        assert!(router.find_html("/a/b").is_none());
    }

    #[test]
    fn test_redirect_respects_methods() {
        let router = router();
        assert!(router.find_redirect("/old", "GET").is_some());
        assert!(router.find_redirect("/old", "POST").is_none());
        assert!(router.find_rewrite("/alias", "POST").is_some());
    }

    #[test]
    fn test_api_and_not_found() {
        let router = router();
        assert!(router.find_api("/api/hello/").is_some());
        assert!(router.find_api("/api/bye").is_none());
        assert_eq!(router.find_not_found("/a/b/c").unwrap().page, "/+not-found");
    }

    #[test]
    fn test_missing_optional_tables() {
        let router = ManifestRouter::default();
        assert!(router.find_redirect("/", "GET").is_none());
        assert!(router.find_rewrite("/", "GET").is_none());
    }
}
