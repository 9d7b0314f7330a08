//! Upstream forwarding.
//!
//! The dispatcher talks to backends through [`Forwarder`] so the transport
//! can be swapped (and observed in tests) without touching dispatch logic.

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::Future;
use std::time::Duration;

use crate::registry::Endpoint;

/// A failed upstream call: no response was received.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct ForwardError {
    pub reason: String,
}

impl ForwardError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Sends a fully built request to one endpoint.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        endpoint: &Endpoint,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// HTTP/1.1 forwarder over a pooled hyper client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        _endpoint: &Endpoint,
        request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        match self.client.request(request).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Err(e) => {
                let reason = match std::error::Error::source(&e) {
                    Some(source) => format!("{e}: {source}"),
                    None => e.to_string(),
                };
                Err(ForwardError::new(reason))
            }
        }
    }
}
