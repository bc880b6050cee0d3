//! Request Routing
//!
//! Classifies every intercepted request into a strategy and a target
//! bucket. Classification is an ordered rule table evaluated top to
//! bottom; the first matching rule wins, and the result is never
//! re-evaluated for a stored entry.

use std::collections::HashSet;

use bridge_traits::http::{HttpMethod, HttpRequest, ResourceKind};
use core_store::BucketNames;
use tracing::debug;
use url::Url;

/// Strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Document load served by the lifecycle navigation path
    Navigation,
    /// Serve the cached copy, fetch only on a miss
    CacheFirst,
    /// Serve the cached copy, refresh it in the background
    StaleWhileRevalidate,
    /// Serve the network, fall back to the cached copy
    NetworkFirst,
}

/// A classified request: which strategy runs and which bucket it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub strategy: StrategyKind,
    pub bucket: String,
}

/// The ordered routing table.
///
/// Rules, first match wins:
///
/// 1. non-GET requests are not intercepted at all
/// 2. navigations go to the navigation strategy, app-shell bucket
/// 3. installed app-shell paths are cache-first, app-shell bucket
/// 4. stylesheets, scripts and fonts are cache-first, app-shell bucket
/// 5. images are stale-while-revalidate, image bucket
/// 6. `/api/` paths and JSON-accepting requests are network-first,
///    api-data bucket
/// 7. everything else is stale-while-revalidate, dynamic bucket
pub struct RouteMatcher {
    buckets: BucketNames,
    app_shell_paths: HashSet<String>,
}

impl RouteMatcher {
    pub fn new(buckets: BucketNames, app_shell_assets: &[String]) -> Self {
        Self {
            buckets,
            app_shell_paths: app_shell_assets.iter().cloned().collect(),
        }
    }

    /// Select the strategy and bucket for an intercepted request, or
    /// `None` when the request must pass through to the network untouched.
    pub fn classify(&self, request: &HttpRequest) -> Option<Route> {
        if request.method != HttpMethod::Get {
            return None;
        }

        let (rule, route) = self.match_rules(request);
        debug!(
            url = %request.url,
            rule,
            strategy = ?route.strategy,
            bucket = %route.bucket,
            "Classified request"
        );

        Some(route)
    }

    fn match_rules(&self, request: &HttpRequest) -> (&'static str, Route) {
        if request.is_navigation() {
            return (
                "navigation",
                self.route(StrategyKind::Navigation, &self.buckets.app_shell),
            );
        }

        let path = request_path(&request.url);

        if self.app_shell_paths.contains(path.as_str()) {
            return (
                "app-shell-asset",
                self.route(StrategyKind::CacheFirst, &self.buckets.app_shell),
            );
        }

        match request.kind {
            ResourceKind::Style | ResourceKind::Script | ResourceKind::Font => {
                return (
                    "static-resource",
                    self.route(StrategyKind::CacheFirst, &self.buckets.app_shell),
                );
            }
            ResourceKind::Image => {
                return (
                    "image",
                    self.route(StrategyKind::StaleWhileRevalidate, &self.buckets.image),
                );
            }
            _ => {}
        }

        if path.starts_with("/api/") || accepts_json(request) {
            return (
                "api-data",
                self.route(StrategyKind::NetworkFirst, &self.buckets.api_data),
            );
        }

        (
            "dynamic",
            self.route(StrategyKind::StaleWhileRevalidate, &self.buckets.dynamic),
        )
    }

    fn route(&self, strategy: StrategyKind, bucket: &str) -> Route {
        Route {
            strategy,
            bucket: bucket.to_string(),
        }
    }
}

/// Canonical cache identity for a request URL.
///
/// Strips tracking parameters (`utm_*` prefixed and `fbclid`) so a
/// campaign-decorated link hits the same cached entry as the clean URL.
/// Every other query parameter stays significant. Unparseable URLs are
/// used verbatim.
pub fn normalize_cache_key(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    if parsed.query().is_none() {
        return parsed.into();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    parsed.into()
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || key == "fbclid"
}

fn accepts_json(request: &HttpRequest) -> bool {
    request
        .accept()
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            // Relative URL; take everything before the query or fragment.
            let path = url
                .split(|c| c == '?' || c == '#')
                .next()
                .unwrap_or(url);
            path.to_string()
        }
    }
}
