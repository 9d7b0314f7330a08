//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the logical service for a request path
//! - Select an endpoint and forward the request to it
//! - Relay the upstream response unmodified, whatever its status
//! - Apply the failure policy: one retry on an unreachable upstream,
//!   no retry on timeout
//!
//! # Design Decisions
//! - Route and endpoint lookups are in-memory; only the upstream call awaits
//! - The body is buffered once so a retry can resend it
//! - Methods are not distinguished for retry safety

use axum::body::{Body, Bytes};
use axum::http::{uri::Authority, uri::Scheme, Request, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::forward::Forwarder;
use crate::http::request::RequestContext;
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::registry::Endpoint;
use crate::routing::RouteTable;

/// Tunables for a dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Deadline for one upstream call.
    pub upstream_timeout: Duration,
    /// Largest inbound body accepted for forwarding.
    pub max_body_bytes: usize,
    /// Retry once on another endpoint when the upstream is unreachable.
    pub retry_enabled: bool,
}

impl DispatchSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            upstream_timeout: Duration::from_millis(config.timeouts.upstream_ms),
            max_body_bytes: config.listener.max_body_bytes,
            retry_enabled: config.retries.enabled,
        }
    }
}

/// Routes, balances and forwards inbound requests.
pub struct Dispatcher<F> {
    routes: Arc<RouteTable>,
    balancer: Arc<LoadBalancer>,
    forwarder: F,
    settings: DispatchSettings,
}

impl<F: Forwarder> Dispatcher<F> {
    pub fn new(
        routes: Arc<RouteTable>,
        balancer: Arc<LoadBalancer>,
        forwarder: F,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            routes,
            balancer,
            forwarder,
            settings,
        }
    }

    /// Handle one inbound request. Never fails: errors become responses.
    pub async fn handle(&self, ctx: RequestContext) -> Response {
        let start = Instant::now();
        let method = ctx.method.to_string();
        let request_id = ctx.request_id().to_string();
        let path = ctx.path().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Dispatching request"
        );

        let service = self
            .routes
            .resolve(&path)
            .map(|route| route.service().to_string());

        let outcome = match &service {
            Some(service) => self.dispatch(service, ctx).await,
            None => Err(GatewayError::RouteNotFound(path.clone())),
        };
        let service_label = service.as_deref().unwrap_or("none");

        match outcome {
            Ok(response) => {
                metrics::record_request(&method, response.status().as_u16(), service_label, start);
                response
            }
            Err(err) => {
                match &err {
                    GatewayError::RouteNotFound(_) => {
                        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
                    }
                    GatewayError::NoEndpointAvailable(_)
                    | GatewayError::PayloadTooLarge
                    | GatewayError::BodyRead(_) => {
                        tracing::warn!(request_id = %request_id, path = %path, error = %err, "Request rejected");
                    }
                    _ => {
                        tracing::error!(request_id = %request_id, path = %path, error = %err, "Request failed");
                    }
                }
                metrics::record_request(&method, err.status_code().as_u16(), service_label, start);
                err.into_response()
            }
        }
    }

    async fn dispatch(&self, service: &str, ctx: RequestContext) -> Result<Response, GatewayError> {
        let mut endpoint = self.balancer.select(service)?;

        let RequestContext {
            method,
            uri,
            headers,
            body,
        } = ctx;
        let body = axum::body::to_bytes(body, self.settings.max_body_bytes)
            .await
            .map_err(classify_body_error)?;

        let max_attempts = if self.settings.retry_enabled { 2 } else { 1 };
        let mut attempt = 1;

        loop {
            let request = build_upstream_request(&method, &uri, &headers, &endpoint, body.clone())?;
            // Dropping this future (client gone) drops the upstream call with it
            let outcome = tokio::time::timeout(
                self.settings.upstream_timeout,
                self.forwarder.forward(&endpoint, request),
            )
            .await;

            match outcome {
                Ok(Ok(response)) => {
                    tracing::debug!(
                        service = %service,
                        endpoint = %endpoint,
                        attempt,
                        status = %response.status(),
                        "Upstream responded"
                    );
                    return Ok(response);
                }
                Ok(Err(e)) => {
                    metrics::record_upstream_failure(service, "connect");
                    tracing::warn!(
                        service = %service,
                        endpoint = %endpoint,
                        attempt,
                        error = %e,
                        "Upstream unreachable"
                    );

                    let failure = GatewayError::UpstreamConnect {
                        endpoint: endpoint.address(),
                        reason: e.reason,
                    };
                    if attempt >= max_attempts {
                        return Err(failure);
                    }

                    endpoint = match self.balancer.select_excluding(service, &endpoint) {
                        Ok(next) => next,
                        Err(_) => return Err(failure),
                    };
                    attempt += 1;
                    tracing::info!(service = %service, endpoint = %endpoint, attempt, "Retrying on another endpoint");
                }
                Err(_) => {
                    metrics::record_upstream_failure(service, "timeout");
                    return Err(GatewayError::UpstreamTimeout(endpoint.address()));
                }
            }
        }
    }
}

/// 413 only when the body limit tripped; anything else the client sent is a 400.
fn classify_body_error(err: axum::Error) -> GatewayError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return GatewayError::PayloadTooLarge;
        }
        source = e.source();
    }
    GatewayError::BodyRead(err.to_string())
}

/// Rebuild the inbound request against `endpoint`, keeping method, path, query and headers.
/// Upstream calls are always HTTP/1.1 whatever the inbound version.
fn build_upstream_request(
    method: &axum::http::Method,
    uri: &Uri,
    headers: &axum::http::HeaderMap,
    endpoint: &Endpoint,
    body: Bytes,
) -> Result<Request<Body>, GatewayError> {
    let authority = Authority::from_str(&endpoint.address())
        .map_err(|e| GatewayError::RequestBuild(format!("invalid endpoint {endpoint}: {e}")))?;

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(axum::http::uri::PathAndQuery::from_static("/"));
    }
    let upstream_uri =
        Uri::from_parts(uri_parts).map_err(|e| GatewayError::RequestBuild(e.to_string()))?;

    let mut request = Request::builder()
        .method(method.clone())
        .uri(upstream_uri)
        .body(Body::from(body))
        .map_err(|e| GatewayError::RequestBuild(e.to_string()))?;
    *request.headers_mut() = headers.clone();

    Ok(request)
}
