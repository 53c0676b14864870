//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use manifest_server::config::ServerConfig;
use manifest_server::http::{ApiRoutes, HttpServer};
use manifest_server::manifest::load_manifest;

/// Manifest of a small exported app.
pub const ROUTES_JSON: &str = r#"{
    "htmlRoutes": [
        { "file": "./index.tsx", "page": "/index", "namedRegex": "^/(?:/)?$", "routeKeys": {} },
        { "file": "./about.tsx", "page": "/about", "namedRegex": "^/about(?:/)?$", "routeKeys": {} },
        { "file": "./blog/[post].tsx", "page": "/blog/[post]", "namedRegex": "^/blog/(?<post>[^/]+?)(?:/)?$", "routeKeys": { "post": "post" } }
    ],
    "apiRoutes": [
        { "file": "./api/users/[id]+api.ts", "page": "/api/users/[id]", "namedRegex": "^/api/users/(?<id>[^/]+?)(?:/)?$", "routeKeys": { "id": "id" } },
        { "file": "./api/context+api.ts", "page": "/api/context", "namedRegex": "^/api/context(?:/)?$", "routeKeys": {} },
        { "file": "./api/teapot+api.ts", "page": "/api/teapot", "namedRegex": "^/api/teapot(?:/)?$", "routeKeys": {} },
        { "file": "./api/unregistered+api.ts", "page": "/api/unregistered", "namedRegex": "^/api/unregistered(?:/)?$", "routeKeys": {} }
    ],
    "notFoundRoutes": [
        { "file": "./+not-found.tsx", "page": "/+not-found", "namedRegex": "^(?:/(?<notFound>.+))?(?:/)?$", "routeKeys": { "notFound": "not-found" } }
    ],
    "redirects": [
        { "file": "./about.tsx", "page": "/about", "namedRegex": "^/old-about(?:/)?$", "routeKeys": {}, "permanent": true },
        { "file": "./blog/[post].tsx", "page": "/blog/[post]", "namedRegex": "^/posts/(?<post>[^/]+?)(?:/)?$", "routeKeys": { "post": "post" }, "permanent": false, "methods": ["GET", "HEAD"] }
    ],
    "rewrites": [
        { "file": "./about.tsx", "page": "/about", "namedRegex": "^/team(?:/)?$", "routeKeys": {} },
        { "file": "./api/users/[id]+api.ts", "page": "/api/users/[id]", "namedRegex": "^/u/(?<id>[^/]+?)(?:/)?$", "routeKeys": { "id": "id" } }
    ]
}"#;

/// Write a dist directory with the manifest and HTML pages.
pub fn write_dist() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("_expo")).unwrap();
    fs::create_dir_all(root.join("blog")).unwrap();
    fs::write(root.join("_expo/routes.json"), ROUTES_JSON).unwrap();
    fs::write(root.join("index.html"), "<h1>Home</h1>").unwrap();
    fs::write(root.join("about.html"), "<h1>About</h1>").unwrap();
    fs::write(root.join("blog/[post].html"), "<h1>Post</h1>").unwrap();
    fs::write(root.join("+not-found.html"), "<h1>Missing</h1>").unwrap();
    dir
}

/// Server config pointing at `dist`.
pub fn config_for(dist: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.manifest.dist_dir = dist.to_string_lossy().into_owned();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.drain_secs = 2;
    config
}

/// Build a server over `dist` with the given API handlers.
pub fn server(dist: &Path, api: ApiRoutes) -> HttpServer {
    server_with_config(config_for(dist), api)
}

pub fn server_with_config(config: ServerConfig, api: ApiRoutes) -> HttpServer {
    let manifest = load_manifest(&config.manifest_file()).unwrap();
    HttpServer::new(config, manifest).with_api_routes(api)
}
