//! Route table, path resolution and route discovery for sitemaps.
//!
//! The table below is also the input of [`discover_routes`], which scans this
//! file's text for `RouteDecl` literals and reads their `path` field. Keep the
//! `path` field first in each declaration.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    PersonDetail,
    Admin,
    NotFound,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteDecl {
    pub path: &'static str,
    pub view: View,
}

/// Matched in order; `*` catches everything else and must stay last.
pub const ROUTE_TABLE: &[RouteDecl] = &[
    RouteDecl { path: "/", view: View::Home },
    RouteDecl { path: "/person/:person_id", view: View::PersonDetail },
    RouteDecl { path: "/admin", view: View::Admin },
    RouteDecl { path: "*", view: View::NotFound },
];

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    PersonDetail(String),
    Admin,
    NotFound(String),
}

impl Route {
    /// Match `path` against [`ROUTE_TABLE`]. Query strings and trailing
    /// slashes are ignored.
    pub fn resolve(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for decl in ROUTE_TABLE {
            if let Some(params) = match_pattern(decl.path, &segments) {
                return match decl.view {
                    View::Home => Route::Home,
                    View::Admin => Route::Admin,
                    View::PersonDetail => match params.into_iter().next() {
                        Some(id) => Route::PersonDetail(id.to_string()),
                        None => Route::NotFound(path.to_string()),
                    },
                    View::NotFound => Route::NotFound(path.to_string()),
                };
            }
        }
        Route::NotFound(path.to_string())
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::PersonDetail(id) => format!("/person/{id}"),
            Route::Admin => "/admin".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }
}

/// Parameter values captured by `pattern`, or `None` when it does not match.
fn match_pattern<'a>(pattern: &str, segments: &[&'a str]) -> Option<Vec<&'a str>> {
    if pattern == "*" {
        return Some(Vec::new());
    }
    let expected: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if expected.len() != segments.len() {
        return None;
    }
    let mut params = Vec::new();
    for (want, got) in expected.iter().zip(segments) {
        if want.starts_with(':') {
            params.push(*got);
        } else if want != got {
            return None;
        }
    }
    Some(params)
}

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub exclude: Vec<String>,
    /// Drop paths with a `:param` placeholder.
    pub exclude_dynamic: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            exclude_dynamic: true,
        }
    }
}

/// Paths declared in the routing source at `path`, minus exclusions and
/// duplicates, in declaration order. An unreadable file yields an empty list.
pub fn discover_routes(path: &Path, options: &DiscoveryOptions) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(source) => {
            let routes = extract_routes(&source, options);
            info!(file = %path.display(), count = routes.len(), "discovered routes");
            routes
        }
        Err(err) => {
            warn!(file = %path.display(), error = %err, "could not read routing source");
            Vec::new()
        }
    }
}

/// [`discover_routes`] over already-loaded text.
pub fn extract_routes(source: &str, options: &DiscoveryOptions) -> Vec<String> {
    let Ok(pattern) = Regex::new(r#"RouteDecl\s*\{\s*path:\s*"([^"]+)""#) else {
        return Vec::new();
    };

    let declared: Vec<&str> = pattern
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let routes: Vec<String> = declared
        .iter()
        .filter(|route| !(options.exclude_dynamic && route.contains(':')))
        .filter(|route| !options.exclude.iter().any(|excluded| excluded.as_str() == **route))
        .filter(|route| seen.insert(**route))
        .map(|route| route.to_string())
        .collect();

    info!(
        total = declared.len(),
        kept = routes.len(),
        excluded = declared.len() - routes.len(),
        "route extraction"
    );
    routes
}

/// Minimal sitemap document for `host` and the given paths.
pub fn render_sitemap(host: &str, routes: &[String]) -> String {
    let host = host.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for route in routes {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_xml(&format!("{host}{route}")));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
