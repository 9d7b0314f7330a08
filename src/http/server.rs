//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the registry, route table, load balancer and dispatcher from config
//! - Create the Axum router that hands every request to the dispatcher
//! - Wire up middleware (tracing, request ID)
//! - Start background tasks (health monitor, registry event watcher, admin API)
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::config::GatewayConfig;
use crate::health::HealthMonitor;
use crate::http::dispatcher::{DispatchSettings, Dispatcher};
use crate::http::forward::HttpForwarder;
use crate::http::request::{MakeGatewayRequestId, RequestContext, X_REQUEST_ID};
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::registry::{seed_static, EndpointRegistry, RegistryEvent};
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<HttpForwarder>>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<EndpointRegistry>,
    routes: Arc<RouteTable>,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(EndpointRegistry::new());
        let seeded = seed_static(registry.as_ref(), &config.instances);

        let routes = Arc::new(RouteTable::from_config(&config.routes));
        let balancer = Arc::new(LoadBalancer::new(
            registry.clone(),
            config.load_balancer.policy,
        ));
        let forwarder = HttpForwarder::new(Duration::from_millis(config.timeouts.connect_ms));
        let dispatcher = Arc::new(Dispatcher::new(
            routes.clone(),
            balancer,
            forwarder,
            DispatchSettings::from_config(&config),
        ));

        tracing::info!(
            routes = routes.len(),
            instances = seeded,
            policy = ?config.load_balancer.policy,
            "Gateway initialised"
        );

        let router = Self::build_router(AppState { dispatcher });
        Self {
            router,
            config,
            registry,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeGatewayRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The registry backing this gateway, for discovery sources.
    pub fn registry(&self) -> Arc<EndpointRegistry> {
        self.registry.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.registry.clone(), self.config.health_check.clone());
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        for listing in self.registry.snapshot() {
            for endpoint in &listing.endpoints {
                metrics::record_endpoint_health(&listing.service, &endpoint.address(), endpoint.healthy);
            }
        }
        tokio::spawn(watch_registry(
            self.registry.subscribe(),
            shutdown.resubscribe(),
        ));

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_router = admin::setup_admin_router(admin::AdminState {
                registry: self.registry.clone(),
                routes: self.routes.clone(),
            });
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler: everything is dispatched.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.handle(RequestContext::from(request)).await
}

/// Log registry changes and mirror endpoint health into metrics.
async fn watch_registry(
    mut events: broadcast::Receiver<RegistryEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(RegistryEvent::InstanceUp { service, endpoint }) => {
                    metrics::record_endpoint_health(&service, &endpoint.address(), endpoint.healthy);
                }
                Ok(RegistryEvent::HealthChanged { service, endpoint }) => {
                    metrics::record_endpoint_health(&service, &endpoint.address(), endpoint.healthy);
                }
                Ok(RegistryEvent::InstanceDown { service, endpoint }) => {
                    metrics::record_endpoint_health(&service, &endpoint.address(), false);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Registry watcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
