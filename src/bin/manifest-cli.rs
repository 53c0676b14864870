use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use axum::http::Request;
use url::Url;

use manifest_server::manifest::{load_manifest, Manifest, Route};
use manifest_server::routing::{get_redirect_rewrite_location, parse_params, ManifestRouter, RouteKind};

#[derive(Parser)]
#[command(name = "manifest-cli")]
#[command(about = "Inspect the route manifest of an exported app", long_about = None)]
struct Cli {
    /// Path to routes.json.
    #[arg(short, long, default_value = "dist/_expo/routes.json")]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every route and report the table sizes
    Check,
    /// List all routes in matching order
    Routes,
    /// Show which route a request would hit, following rewrites
    Match {
        path: String,
        #[arg(long, default_value = "GET")]
        method: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let manifest = load_manifest(&cli.manifest)?;

    match cli.command {
        Commands::Check => {
            print_json(&json!({
                "redirects": manifest.redirects.as_ref().map_or(0, Vec::len),
                "rewrites": manifest.rewrites.as_ref().map_or(0, Vec::len),
                "htmlRoutes": manifest.html_routes.len(),
                "apiRoutes": manifest.api_routes.len(),
                "notFoundRoutes": manifest.not_found_routes.len(),
            }))?;
        }
        Commands::Routes => {
            print_json(&route_table(&manifest))?;
        }
        Commands::Match { path, method } => {
            let router = ManifestRouter::new(manifest);
            match resolve(&router, &path, &method)? {
                Some(resolution) => print_json(&resolution)?,
                None => {
                    eprintln!("No route matches {method} {path}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn request_for(method: &str, target: &str) -> Result<Request<()>, axum::http::Error> {
    Request::builder().method(method).uri(target).body(())
}

/// Walk the tables in the same order as the request handler.
fn resolve(router: &ManifestRouter, target: &str, method: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut url = Url::parse("http://localhost")?.join(target)?;
    let mut request = request_for(method, target)?;

    if let Some(route) = router.find_redirect(url.path(), method) {
        let location = get_redirect_rewrite_location(&url, &request, route);
        return Ok(Some(json!({
            "kind": RouteKind::Redirect.as_str(),
            "page": route.page,
            "params": parse_params(&request, route),
            "permanent": route.permanent.unwrap_or(false),
            "location": location.as_str(),
        })));
    }

    let mut rewritten_from = None;
    if let Some(route) = router.find_rewrite(url.path(), method) {
        let location = get_redirect_rewrite_location(&url, &request, route);
        let rewritten = match location.query() {
            Some(query) => format!("{}?{}", location.path(), query),
            None => location.path().to_string(),
        };
        rewritten_from = Some(url.path().to_string());
        request = request_for(method, &rewritten)?;
        url = location;
    }

    let html = method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD");
    let pathname = url.path();
    let found = router
        .find_html(pathname)
        .filter(|_| html)
        .map(|r| (RouteKind::Html, r))
        .or_else(|| router.find_api(pathname).map(|r| (RouteKind::Api, r)))
        .or_else(|| router.find_not_found(pathname).filter(|_| html).map(|r| (RouteKind::NotFound, r)));

    Ok(found.map(|(kind, route)| {
        json!({
            "kind": kind.as_str(),
            "page": route.page,
            "params": parse_params(&request, route),
            "rewrittenFrom": rewritten_from,
        })
    }))
}

fn route_table(manifest: &Manifest) -> Value {
    let section = |routes: &[Route]| -> Vec<Value> {
        routes
            .iter()
            .map(|r| json!({ "page": r.page, "namedRegex": r.named_regex.as_str() }))
            .collect()
    };
    json!({
        "redirects": manifest.redirects.as_deref().map(section),
        "rewrites": manifest.rewrites.as_deref().map(section),
        "htmlRoutes": section(&manifest.html_routes),
        "apiRoutes": section(&manifest.api_routes),
        "notFoundRoutes": section(&manifest.not_found_routes),
    })
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
