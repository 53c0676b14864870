//! Route parameter extraction and redirect / rewrite targets.
//!
//! # Responsibilities
//! - Pull named parameters out of a matched pathname
//! - Rebuild a destination URL from a route's page template
//! - Carry unused parameters and the original query string over
//!
//! # Design Decisions
//! - No match yields an empty map, never an error
//! - A `[name]` destination segment keeps only the first path element of its value
//! - A `[...name]` destination segment keeps the whole value
//! - Template-derived query parameters win over the original query

use std::collections::BTreeMap;

use axum::http::Request;
use url::Url;

use crate::manifest::Route;
use crate::routing::matcher::{match_deep_dynamic_name, match_dynamic_name};

/// Declared parameter name → captured value.
pub type Params = BTreeMap<String, String>;

/// Extract parameters for `pathname`.
pub fn params_for_path(pathname: &str, route: &Route) -> Params {
    let mut params = Params::new();
    let Some(captures) = route.named_regex.captures(pathname) else {
        return params;
    };

    for group in route.named_regex.capture_names().flatten() {
        if let Some(value) = captures.name(group) {
            let key = route
                .route_keys
                .get(group)
                .map(String::as_str)
                .unwrap_or(group);
            params.insert(key.to_string(), value.as_str().to_string());
        }
    }
    params
}

/// Extract parameters from the request's pathname.
pub fn parse_params<B>(request: &Request<B>, route: &Route) -> Params {
    params_for_path(request.uri().path(), route)
}

/// Compute the destination of a redirect or rewrite.
///
/// `url` is the full URL of the incoming request; the result keeps its
/// origin unless the page template is itself an absolute URL.
pub fn get_redirect_rewrite_location<B>(url: &Url, request: &Request<B>, route: &Route) -> Url {
    let mut params = parse_params(request, route);

    let target = route
        .page
        .split('/')
        .map(|segment| {
            if let Some(name) = match_dynamic_name(segment) {
                let value = params.remove(name).unwrap_or_default();
                // Catch-all values are cut to their first segment here.
                value.split('/').next().unwrap_or_default().to_string()
            } else if let Some(name) = match_deep_dynamic_name(segment) {
                params.remove(name).unwrap_or_default()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut target_url = match Url::parse(&target) {
        Ok(absolute) => absolute,
        Err(_) => {
            let mut relative = url.clone();
            relative.set_path(&target);
            relative.set_query(None);
            relative.set_fragment(None);
            relative
        }
    };

    let mut pairs: Vec<(String, String)> = params.into_iter().collect();
    for (key, value) in url.query_pairs() {
        if !pairs.iter().any(|(existing, _)| *existing == key) {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    if !pairs.is_empty() {
        target_url.query_pairs_mut().extend_pairs(pairs);
    }
    target_url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::schema::RouteInfo;
    use axum::body::Body;

    fn route(regex: &str, keys: &[(&str, &str)], page: &str) -> Route {
        Route::compile(&RouteInfo {
            named_regex: regex.to_string(),
            route_keys: keys
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            page: page.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn request(uri: &str) -> (Url, Request<Body>) {
        let url = Url::parse(uri).unwrap();
        let req = Request::builder().uri(uri).body(Body::default()).unwrap();
        (url, req)
    }

    #[test]
    fn test_parse_params_uses_declared_names() {
        let r = route(
            r"^/users/(?<nxtPid>[^/]+?)/posts/(?<nxtPpost>[^/]+?)(?:/)?$",
            &[("nxtPid", "id"), ("nxtPpost", "post")],
            "/users/[id]/posts/[post]",
        );
        let (_, req) = request("http://example.com/users/7/posts/hello");
        let params = parse_params(&req, &r);
        assert_eq!(params.get("id").map(String::as_str), Some("7"));
        assert_eq!(params.get("post").map(String::as_str), Some("hello"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_parse_params_no_match_is_empty() {
        let r = route(r"^/users/(?<id>[^/]+?)(?:/)?$", &[("id", "id")], "/users/[id]");
        let (_, req) = request("http://example.com/teams/7");
        assert!(parse_params(&req, &r).is_empty());
    }

    #[test]
    fn test_redirect_substitutes_and_keeps_origin() {
        let r = route(r"^/old/(?<slug>[^/]+?)(?:/)?$", &[("slug", "slug")], "/new/[slug]");
        let (url, req) = request("https://example.com:8443/old/hello");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.as_str(), "https://example.com:8443/new/hello");
    }

    #[test]
    fn test_unused_params_become_query() {
        let r = route(
            r"^/p/(?<a>[^/]+?)/(?<b>[^/]+?)(?:/)?$",
            &[("a", "a"), ("b", "b")],
            "/target/[a]",
        );
        let (url, req) = request("http://example.com/p/one/two");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.path(), "/target/one");
        assert_eq!(location.query(), Some("b=two"));
    }

    #[test]
    fn test_original_query_kept_but_params_win() {
        let r = route(r"^/old/(?<id>[^/]+?)/(?<tab>[^/]+?)(?:/)?$", &[("id", "id"), ("tab", "tab")], "/new/[id]");
        let (url, req) = request("http://example.com/old/5/info?tab=ignored&ref=mail");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.path(), "/new/5");
        let query: Vec<(String, String)> = location.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("tab".to_string(), "info".to_string()),
                ("ref".to_string(), "mail".to_string()),
            ]
        );
    }

    #[test]
    fn test_catch_all_into_single_segment_is_truncated() {
        let r = route(r"^/blog/(?<slug>.+?)(?:/)?$", &[("slug", "slug")], "/posts/[slug]");
        let (url, req) = request("http://example.com/blog/a/b/c");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.path(), "/posts/a");
    }

    #[test]
    fn test_catch_all_into_catch_all_keeps_every_segment() {
        let r = route(r"^/blog/(?<slug>.+?)(?:/)?$", &[("slug", "slug")], "/blog/[...slug]");
        let (url, req) = request("http://example.com/blog/a/b/c");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.path(), "/blog/a/b/c");
        assert_eq!(location.query(), None);
    }

    #[test]
    fn test_absolute_destination() {
        let r = route(r"^/docs(?:/)?$", &[], "https://docs.example.org/start");
        let (url, req) = request("http://example.com/docs?lang=en");
        let location = get_redirect_rewrite_location(&url, &req, &r);
        assert_eq!(location.as_str(), "https://docs.example.org/start?lang=en");
    }
}
