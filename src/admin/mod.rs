//! Admin API.
//!
//! Read-only views of routes and the registry, plus the write endpoints an
//! external registration agent uses to report instances and health. Served
//! on its own listener, never on the gateway port.

pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use self::handlers::*;
use crate::registry::EndpointRegistry;
use crate::routing::RouteTable;

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<EndpointRegistry>,
    pub routes: Arc<RouteTable>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/services", get(get_services))
        .route("/admin/services/{service}/instances", post(register_instance))
        .route(
            "/admin/services/{service}/instances/{address}",
            delete(deregister_instance),
        )
        .route("/admin/instances/{address}/health", put(update_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Endpoint;
    use crate::routing::RoutePattern;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AdminState {
        AdminState {
            registry: Arc::new(EndpointRegistry::new()),
            routes: Arc::new(RouteTable::new(vec![RoutePattern::new(
                "user-service",
                "/api/users/**",
                "ai-loan-user-service",
            )
            .unwrap()])),
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn register_list_and_deregister() {
        let state = state();
        let router = setup_admin_router(state.clone());

        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/admin/services/ai-loan-user-service/instances",
                serde_json::json!({ "address": "10.0.0.1:8080" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["changed"], true);

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/admin/services/ai-loan-user-service/instances",
                serde_json::json!({ "address": "10.0.0.1:8080" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, services) = send(
            &router,
            Request::builder().uri("/admin/services").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(services[0]["service"], "ai-loan-user-service");
        assert_eq!(services[0]["endpoints"][0]["port"], 8080);

        let (status, _) = send(
            &router,
            Request::builder()
                .method("DELETE")
                .uri("/admin/services/ai-loan-user-service/instances/10.0.0.1:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.registry.resolve("ai-loan-user-service").is_empty());

        let (status, _) = send(
            &router,
            Request::builder()
                .method("DELETE")
                .uri("/admin/services/ai-loan-user-service/instances/10.0.0.1:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_updates() {
        let state = state();
        state
            .registry
            .register("ai-loan-user-service", Endpoint::new("10.0.0.1", 8080));
        let router = setup_admin_router(state.clone());

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                "/admin/instances/10.0.0.1:8080/health",
                serde_json::json!({ "healthy": false }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "ai-loan-user-service");
        assert!(state.registry.resolve("ai-loan-user-service").is_empty());

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                "/admin/instances/10.0.0.9:8080/health",
                serde_json::json!({ "healthy": false }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_bad_address() {
        let router = setup_admin_router(state());
        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/admin/services/x/instances",
                serde_json::json!({ "address": "nope" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("host:port"));
    }

    #[tokio::test]
    async fn status_and_routes() {
        let router = setup_admin_router(state());
        let (_, status) = send(
            &router,
            Request::builder().uri("/admin/status").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status["routes"], 1);
        assert_eq!(status["endpoints"], 0);

        let (_, routes) = send(
            &router,
            Request::builder().uri("/admin/routes").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(routes[0]["path_prefix"], "/api/users");
        assert_eq!(routes[0]["service"], "ai-loan-user-service");
    }
}
