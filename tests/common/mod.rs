//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use service_gateway::config::{GatewayConfig, InstanceConfig, RouteConfig};
use service_gateway::registry::EndpointRegistry;
use service_gateway::{GatewayServer, Shutdown};

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a backend that answers every request with a JSON description of
/// what it received, tagged with `name`.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let router = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
            let request_id = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            Json(json!({
                "backend": name,
                "method": method.as_str(),
                "uri": uri.to_string(),
                "request_id": request_id,
                "body": String::from_utf8_lossy(&body),
            }))
        },
    );
    serve(router).await
}

/// Start a programmable backend; `f` decides status and body per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let router = Router::new().fallback(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
                [("x-backend", "programmable")],
                body,
            )
        }
    });
    serve(router).await
}

/// An address nothing listens on.
pub async fn refused_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn route(id: &str, path: &str, service: &str) -> RouteConfig {
    RouteConfig {
        id: id.into(),
        path: path.into(),
        service: None,
        uri: Some(format!("lb://{service}")),
    }
}

pub fn instance(service: &str, addr: SocketAddr) -> InstanceConfig {
    InstanceConfig {
        service: service.into(),
        address: addr.to_string(),
    }
}

/// Baseline config for tests: no health probing, no metrics exporter.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health_check.enabled = false;
    config.observability.metrics_enabled = false;
    config.timeouts.connect_ms = 1_000;
    config.timeouts.upstream_ms = 5_000;
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub registry: Arc<EndpointRegistry>,
    pub shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(config);
    let registry = server.registry();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningGateway {
        addr,
        registry,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn backend_of(res: reqwest::Response) -> String {
    let json: Value = res.json().await.unwrap();
    json["backend"].as_str().unwrap().to_string()
}
