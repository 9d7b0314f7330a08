//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled route patterns in declaration order
//! - Resolve a request path to a logical service name
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan, acceptable for typical route counts
//! - First declared match wins

use serde::Serialize;
use url::Url;

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// URI scheme for load-balanced service targets.
pub const LB_SCHEME: &str = "lb";

/// A compiled route: path prefix → logical service name.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    id: String,
    matcher: PathPrefixMatcher,
    service: String,
}

impl RoutePattern {
    pub fn new(
        id: impl Into<String>,
        path: &str,
        service: impl Into<String>,
    ) -> Result<Self, String> {
        let service = service.into();
        if service.trim().is_empty() {
            return Err("service name is empty".to_string());
        }
        Ok(Self {
            id: id.into(),
            matcher: PathPrefixMatcher::new(path)?,
            service,
        })
    }

    /// Compile a configured route, resolving `lb://` targets.
    pub fn from_config(config: &RouteConfig) -> Result<Self, String> {
        let service = match (&config.service, &config.uri) {
            (Some(service), None) => service.clone(),
            (None, Some(uri)) => service_from_uri(uri)?,
            (Some(_), Some(_)) => {
                return Err("set either 'service' or 'uri', not both".to_string())
            }
            (None, None) => return Err("one of 'service' or 'uri' is required".to_string()),
        };
        Self::new(config.id.clone(), &config.path, service)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path_prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

/// Extract the service name from an `lb://service-name` URI.
fn service_from_uri(uri: &str) -> Result<String, String> {
    let url = Url::parse(uri).map_err(|e| format!("invalid uri '{uri}': {e}"))?;
    if url.scheme() != LB_SCHEME {
        return Err(format!(
            "uri '{uri}' must use the '{LB_SCHEME}://' scheme"
        ));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(format!("uri '{uri}' has no service name")),
    }
}

/// Serializable view of a route for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub path_prefix: String,
    pub service: String,
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RoutePattern>,
}

impl RouteTable {
    pub fn new(routes: Vec<RoutePattern>) -> Self {
        Self { routes }
    }

    /// Compile routes from configuration. Invalid entries are skipped with a warning;
    /// `validate_config` rejects them before this point in normal startup.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let routes = configs
            .iter()
            .filter_map(|config| match RoutePattern::from_config(config) {
                Ok(route) => Some(route),
                Err(reason) => {
                    tracing::warn!(route = %config.id, %reason, "Skipping invalid route");
                    None
                }
            })
            .collect();
        Self { routes }
    }

    /// Find the first route whose prefix matches `path`.
    pub fn resolve(&self, path: &str) -> Option<&RoutePattern> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes
            .iter()
            .map(|route| RouteSummary {
                id: route.id.clone(),
                path_prefix: route.path_prefix().to_string(),
                service: route.service.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
