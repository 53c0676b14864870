//! Middleware matching logic.
//!
//! # Responsibilities
//! - Decide whether user middleware runs for a request
//! - Match HTTP method (case-insensitive)
//! - Match path patterns (literal, dynamic template, or regex)
//!
//! # Design Decisions
//! - Patterns are classified and compiled once, at construction
//! - No matcher, or a matcher with neither methods nor patterns, runs everywhere
//! - An empty pattern list never matches
//! - First matching pattern wins

use axum::http::{Method, Request};
use axum::http::request::Parts;
use axum::response::Response;
use futures_util::future::BoxFuture;
use regex::Regex;
use serde::Deserialize;

use crate::runtime::HandlerError;

/// One middleware path pattern.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawPattern")]
pub enum MatcherPattern {
    /// Exact pathname, e.g. `/api/health`.
    Literal(String),
    /// Template with `[name]` segments only.
    Dynamic { source: String, regex: Regex },
    /// Template with at least one `[...name]` segment.
    DeepDynamic { source: String, regex: Regex },
    /// Caller-supplied regex, tested as-is.
    Regex(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPattern {
    Path(String),
    Regex { regex: String },
}

impl TryFrom<RawPattern> for MatcherPattern {
    type Error = regex::Error;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        match raw {
            RawPattern::Path(path) => MatcherPattern::parse(&path),
            RawPattern::Regex { regex } => Ok(MatcherPattern::Regex(Regex::new(&regex)?)),
        }
    }
}

impl MatcherPattern {
    /// Classify a string pattern, compiling templates that contain
    /// dynamic segments.
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        let segments = || pattern.split('/');
        if segments().any(|s| match_deep_dynamic_name(s).is_some()) {
            Ok(MatcherPattern::DeepDynamic {
                source: pattern.to_string(),
                regex: pattern_to_regex(pattern)?,
            })
        } else if segments().any(|s| match_dynamic_name(s).is_some()) {
            Ok(MatcherPattern::Dynamic {
                source: pattern.to_string(),
                regex: pattern_to_regex(pattern)?,
            })
        } else {
            Ok(MatcherPattern::Literal(pattern.to_string()))
        }
    }

    pub fn matches(&self, pathname: &str) -> bool {
        match self {
            MatcherPattern::Literal(literal) => literal == pathname,
            MatcherPattern::Dynamic { source, regex }
            | MatcherPattern::DeepDynamic { source, regex } => {
                source == pathname || regex.is_match(pathname)
            }
            MatcherPattern::Regex(regex) => regex.is_match(pathname),
        }
    }
}

impl From<Regex> for MatcherPattern {
    fn from(regex: Regex) -> Self {
        MatcherPattern::Regex(regex)
    }
}

/// Returns the parameter name of a `[name]` segment.
pub fn match_dynamic_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('[')?.strip_suffix(']')?;
    if name.is_empty() || name.starts_with("...") || name.contains(['[', ']', '/']) {
        return None;
    }
    Some(name)
}

/// Returns the parameter name of a `[...name]` segment.
pub fn match_deep_dynamic_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix("[...")?.strip_suffix(']')?;
    if name.is_empty() || name.contains(['[', ']', '/']) {
        return None;
    }
    Some(name)
}

/// Convert a route template into an anchored regex.
///
/// `[...name]` becomes `.+`, `[name]` becomes `[^/]+`, everything else is
/// escaped. A trailing slash on the request path is tolerated.
pub fn pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let normalized = match pattern.strip_suffix('/') {
        Some(stripped) if pattern != "/" => stripped,
        _ => pattern,
    };

    let body = normalized
        .split('/')
        .map(|segment| {
            if match_deep_dynamic_name(segment).is_some() {
                ".+".to_string()
            } else if match_dynamic_name(segment).is_some() {
                "[^/]+".to_string()
            } else {
                regex::escape(segment)
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    Regex::new(&format!("^{body}(?:/)?$"))
}

/// Which requests a middleware applies to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MiddlewareMatcher {
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    #[serde(default)]
    pub patterns: Option<Vec<MatcherPattern>>,
}

/// Settings a middleware module exposes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MiddlewareSettings {
    #[serde(default)]
    pub matcher: Option<MiddlewareMatcher>,
}

/// User middleware that runs ahead of route handling.
pub trait Middleware: Send + Sync {
    fn settings(&self) -> Option<&MiddlewareSettings> {
        None
    }

    /// Return `Some(response)` to answer the request directly.
    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Result<Option<Response>, HandlerError>>;
}

/// Whether `pattern` accepts `pathname`.
pub fn matches_pattern(pathname: &str, pattern: &MatcherPattern) -> bool {
    pattern.matches(pathname)
}

/// Whether `settings` select a request with this method and pathname.
pub fn should_run_for(method: &Method, pathname: &str, settings: Option<&MiddlewareSettings>) -> bool {
    let Some(matcher) = settings.and_then(|s| s.matcher.as_ref()) else {
        return true;
    };

    if let Some(methods) = &matcher.methods {
        if !methods.iter().any(|m| m.eq_ignore_ascii_case(method.as_str())) {
            return false;
        }
    }

    if let Some(patterns) = &matcher.patterns {
        return patterns.iter().any(|p| matches_pattern(pathname, p));
    }

    true
}

/// Whether `middleware` should run for `request`.
pub fn should_run_middleware<B, M>(request: &Request<B>, middleware: &M) -> bool
where
    M: Middleware + ?Sized,
{
    should_run_for(request.method(), request.uri().path(), middleware.settings())
}
