//! Manifest compilation.
//!
//! # Responsibilities
//! - Turn every `namedRegex` string into a compiled [`Regex`]
//! - Produce fresh route tables (shallow copies of each descriptor)
//! - Convert back to the raw form for re-serialization
//!
//! # Design Decisions
//! - The regex source is compiled verbatim; no flags are added
//! - The first compile failure aborts the whole pass

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::manifest::schema::{RawManifest, RouteInfo};

/// A route with its matcher compiled.
#[derive(Debug, Clone)]
pub struct Route {
    pub named_regex: Regex,
    pub route_keys: HashMap<String, String>,
    pub page: String,
    pub file: Option<String>,
    pub permanent: Option<bool>,
    pub methods: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

impl Route {
    /// Compile a single raw route descriptor.
    pub fn compile(info: &RouteInfo) -> Result<Self, regex::Error> {
        Ok(Self {
            named_regex: Regex::new(&info.named_regex)?,
            route_keys: info.route_keys.clone(),
            page: info.page.clone(),
            file: info.file.clone(),
            permanent: info.permanent,
            methods: info.methods.clone(),
            extra: info.extra.clone(),
        })
    }

    /// Whether the route's matcher accepts `pathname`.
    pub fn is_match(&self, pathname: &str) -> bool {
        self.named_regex.is_match(pathname)
    }

    /// Whether `method` is allowed by this route's optional method list.
    pub fn allows_method(&self, method: &str) -> bool {
        match &self.methods {
            Some(methods) => methods.iter().any(|m| m.eq_ignore_ascii_case(method)),
            None => true,
        }
    }

    /// Back to the JSON-safe form.
    pub fn to_info(&self) -> RouteInfo {
        RouteInfo {
            named_regex: self.named_regex.as_str().to_string(),
            route_keys: self.route_keys.clone(),
            page: self.page.clone(),
            file: self.file.clone(),
            permanent: self.permanent,
            methods: self.methods.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Compiled route manifest. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub html_routes: Vec<Route>,
    pub api_routes: Vec<Route>,
    pub not_found_routes: Vec<Route>,
    pub redirects: Option<Vec<Route>>,
    pub rewrites: Option<Vec<Route>>,
}

impl Manifest {
    /// Serialize back into a [`RawManifest`].
    pub fn to_raw(&self) -> RawManifest {
        let to_infos = |routes: &[Route]| routes.iter().map(Route::to_info).collect::<Vec<_>>();
        RawManifest {
            html_routes: to_infos(&self.html_routes),
            api_routes: to_infos(&self.api_routes),
            not_found_routes: to_infos(&self.not_found_routes),
            redirects: self.redirects.as_deref().map(to_infos),
            rewrites: self.rewrites.as_deref().map(to_infos),
        }
    }

    /// Total number of routes across all tables.
    pub fn route_count(&self) -> usize {
        self.html_routes.len()
            + self.api_routes.len()
            + self.not_found_routes.len()
            + self.redirects.as_ref().map_or(0, Vec::len)
            + self.rewrites.as_ref().map_or(0, Vec::len)
    }
}

fn compile_all(routes: &[RouteInfo]) -> Result<Vec<Route>, regex::Error> {
    routes.iter().map(Route::compile).collect()
}

/// Compile every route table of a raw manifest.
///
/// Returns a new [`Manifest`]; `raw` is left untouched. A malformed
/// `namedRegex` surfaces the underlying [`regex::Error`].
pub fn init_manifest_regexp(raw: &RawManifest) -> Result<Manifest, regex::Error> {
    Ok(Manifest {
        html_routes: compile_all(&raw.html_routes)?,
        api_routes: compile_all(&raw.api_routes)?,
        not_found_routes: compile_all(&raw.not_found_routes)?,
        redirects: raw.redirects.as_deref().map(compile_all).transpose()?,
        rewrites: raw.rewrites.as_deref().map(compile_all).transpose()?,
    })
}
