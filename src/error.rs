//! Gateway error types.
//!
//! Every failure on the request path maps to exactly one HTTP status so the
//! dispatcher can surface it without inspecting the cause.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No route matches path: {0}")]
    RouteNotFound(String),

    #[error("No healthy endpoint available for service: {0}")]
    NoEndpointAvailable(String),

    #[error("Upstream {endpoint} unreachable: {reason}")]
    UpstreamConnect { endpoint: String, reason: String },

    #[error("Upstream {0} timed out")]
    UpstreamTimeout(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Failed to build upstream request: {0}")]
    RequestBuild(String),
}

impl GatewayError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::RouteNotFound(_) => "route_not_found",
            Self::NoEndpointAvailable(_) => "no_endpoint_available",
            Self::UpstreamConnect { .. } => "upstream_connect",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::PayloadTooLarge => "payload_too_large",
            Self::BodyRead(_) => "body_read_failed",
            Self::RequestBuild(_) => "request_build_failed",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::NoEndpointAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamConnect { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::RequestBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Endpoint addresses stay in the logs, not in client responses
        let message = match &self {
            Self::RouteNotFound(_) => "No matching route found".to_owned(),
            Self::NoEndpointAvailable(service) => {
                format!("No healthy endpoints for service: {service}")
            }
            Self::UpstreamConnect { .. } => "Upstream request failed".to_owned(),
            Self::UpstreamTimeout(_) => "Upstream request timed out".to_owned(),
            Self::PayloadTooLarge => "Request body too large".to_owned(),
            Self::BodyRead(_) => "Malformed request body".to_owned(),
            Self::RequestBuild(_) => "Internal server error".to_owned(),
        };

        (status, message).into_response()
    }
}
