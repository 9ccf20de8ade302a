//! Route lookup and path rewriting.
//!
//! # Responsibilities
//! - Hold the static route table built at startup
//! - Look up the matching route for a request path, first match wins
//! - Rewrite the gateway-facing prefix into the upstream-facing one
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan over six entries; explicit no-match rather than a
//!   silent default

use axum::http::Uri;

use crate::config::ServicesConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Which route-specific limiter applies to a route, beyond the general one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterClass {
    Auth,
    Upload,
}

/// One entry of the gateway's route table.
#[derive(Debug, Clone)]
pub struct ServiceRoute {
    /// Service identifier for logging and metrics.
    pub name: &'static str,

    /// Gateway-facing prefix.
    matcher: PathPrefixMatcher,

    /// Upstream base URL, e.g. "http://localhost:4003".
    pub upstream: String,

    /// Upstream-facing prefix that replaces the gateway-facing one.
    pub rewrite: &'static str,

    /// Route-specific limiter, if any. The general limiter always applies.
    pub limiter: Option<LimiterClass>,

    /// Whether a verified bearer token is required.
    pub auth_required: bool,
}

impl ServiceRoute {
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Rewrite the gateway-facing path into the upstream-facing one.
    pub fn rewrite_path(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.matcher.prefix()).unwrap_or(path);
        let rewritten = format!("{}{}", self.rewrite, rest);
        if rewritten.is_empty() {
            "/".to_string()
        } else {
            rewritten
        }
    }

    /// Full upstream URI for a rewritten path plus the original query string.
    pub fn upstream_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::uri::InvalidUri> {
        let base = self.upstream.trim_end_matches('/');
        match query {
            Some(query) => format!("{}{}?{}", base, path, query).parse(),
            None => format!("{}{}", base, path).parse(),
        }
    }
}

/// The static route table. Six entries, checked in declaration order.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<ServiceRoute>,
}

impl RouteTable {
    /// Build the table from configured service URLs.
    pub fn from_services(services: &ServicesConfig) -> Self {
        let routes = vec![
            ServiceRoute {
                name: "auth",
                matcher: PathPrefixMatcher::new("/api/auth"),
                upstream: services.auth_url.clone(),
                rewrite: "/auth",
                limiter: Some(LimiterClass::Auth),
                auth_required: false,
            },
            ServiceRoute {
                name: "food",
                matcher: PathPrefixMatcher::new("/api/food"),
                upstream: services.food_url.clone(),
                rewrite: "",
                limiter: Some(LimiterClass::Upload),
                auth_required: true,
            },
            ServiceRoute {
                name: "meals",
                matcher: PathPrefixMatcher::new("/api/meals"),
                upstream: services.meals_url.clone(),
                rewrite: "/meals",
                limiter: None,
                auth_required: true,
            },
            ServiceRoute {
                name: "profile",
                matcher: PathPrefixMatcher::new("/api/profile"),
                upstream: services.profile_url.clone(),
                rewrite: "/profile",
                limiter: None,
                auth_required: true,
            },
            ServiceRoute {
                name: "notifications",
                matcher: PathPrefixMatcher::new("/api/notifications"),
                upstream: services.notifications_url.clone(),
                rewrite: "/notifications",
                limiter: None,
                auth_required: true,
            },
            ServiceRoute {
                name: "analytics",
                matcher: PathPrefixMatcher::new("/api/analytics"),
                upstream: services.analytics_url.clone(),
                rewrite: "/analytics",
                limiter: None,
                auth_required: true,
            },
        ];
        Self { routes }
    }

    /// Look up the route for a path. First match in table order wins.
    pub fn match_path(&self, path: &str) -> Option<&ServiceRoute> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn routes(&self) -> &[ServiceRoute] {
        &self.routes
    }
}
