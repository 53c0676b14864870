//! Serializable route manifest definitions.
//!
//! These types mirror the JSON written by the export pipeline. Regexes are
//! kept in string form here so the manifest stays JSON-safe.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw, JSON-serializable route manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawManifest {
    /// Statically rendered HTML pages.
    #[serde(default)]
    pub html_routes: Vec<RouteInfo>,

    /// Server-side API routes.
    #[serde(default)]
    pub api_routes: Vec<RouteInfo>,

    /// Fallback pages served with a 404 status.
    #[serde(default)]
    pub not_found_routes: Vec<RouteInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirects: Option<Vec<RouteInfo>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrites: Option<Vec<RouteInfo>>,
}

/// One route descriptor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    /// Path-matching regex source, e.g. `^/users/(?<id>[^/]+?)(?:/)?$`.
    pub named_regex: String,

    /// Capture group name → declared parameter name.
    #[serde(default)]
    pub route_keys: HashMap<String, String>,

    /// Page template such as `/users/[id]`.
    pub page: String,

    /// Source file the route was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Redirects only: answer with 308 instead of 307.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,

    /// Redirects and rewrites only: restrict to these HTTP methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Any other fields emitted by the export pipeline.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let raw = RawManifest::from_json(
            r#"{
                "htmlRoutes": [
                    { "namedRegex": "^/(?:/)?$", "routeKeys": {}, "page": "/index", "file": "index.tsx" }
                ],
                "apiRoutes": [],
                "notFoundRoutes": [],
                "redirects": [
                    { "namedRegex": "^/old(?:/)?$", "routeKeys": {}, "page": "/new", "permanent": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.html_routes.len(), 1);
        assert_eq!(raw.html_routes[0].page, "/index");
        assert_eq!(raw.html_routes[0].file.as_deref(), Some("index.tsx"));
        assert!(raw.rewrites.is_none());
        assert_eq!(raw.redirects.unwrap()[0].permanent, Some(true));
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let raw = RawManifest::from_json(
            r#"{
                "htmlRoutes": [
                    { "namedRegex": "^/a(?:/)?$", "routeKeys": {}, "page": "/a", "generated": true }
                ],
                "apiRoutes": [],
                "notFoundRoutes": []
            }"#,
        )
        .unwrap();

        assert_eq!(raw.html_routes[0].extra.get("generated"), Some(&Value::Bool(true)));
        let text = serde_json::to_string(&raw).unwrap();
        assert!(text.contains("\"generated\":true"));
    }
}
