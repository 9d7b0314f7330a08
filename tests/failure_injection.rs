//! Failure injection tests for the gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;
use common::*;

#[tokio::test]
async fn no_instances_is_unavailable() {
    let mut config = test_config();
    config.routes.push(route("user-service", "/api/users/**", "user-service"));
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/api/users/1")).send().await.unwrap();
    assert_eq!(res.status(), 503);
}

#[tokio::test]
async fn refused_instance_retried_on_another() {
    let dead = refused_address().await;
    let live = start_echo_backend("live").await;

    let mut config = test_config();
    config.routes.push(route("loan-service", "/api/loans/**", "loan-service"));
    config.instances.push(instance("loan-service", dead));
    config.instances.push(instance("loan-service", live));
    let gateway = start_gateway(config).await;

    let client = client();
    // Whichever instance the cursor starts on, every request lands on the live one
    for _ in 0..4 {
        let res = client
            .post(gateway.url("/api/loans"))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(backend_of(res).await, "live");
    }
}

#[tokio::test]
async fn second_failure_is_bad_gateway() {
    let first = refused_address().await;
    let second = refused_address().await;

    let mut config = test_config();
    config.routes.push(route("risk-service", "/api/risk/**", "risk-service"));
    config.instances.push(instance("risk-service", first));
    config.instances.push(instance("risk-service", second));
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/api/risk/1")).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");
}

#[tokio::test]
async fn slow_upstream_times_out_without_retry() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = calls.clone();
    let slow = start_programmable_backend(move || {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3)).await;
            (200, "late".to_string())
        }
    })
    .await;

    let mut config = test_config();
    config.timeouts.upstream_ms = 200;
    config.routes.push(route("ai-service", "/api/ai/**", "ai-service"));
    config.instances.push(instance("ai-service", slow));
    let gateway = start_gateway(config).await;

    let start = Instant::now();
    let res = client().get(gateway.url("/api/ai/slow")).send().await.unwrap();
    assert_eq!(res.status(), 504);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = calls.clone();
    let failing = start_programmable_backend(move || {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            (503, "draining".to_string())
        }
    })
    .await;

    let mut config = test_config();
    config.routes.push(route("admin-service", "/api/admin/**", "admin-service"));
    config.instances.push(instance("admin-service", failing));
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/api/admin/x")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "draining");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_body_rejected() {
    let backend = start_echo_backend("users").await;

    let mut config = test_config();
    config.listener.max_body_bytes = 16;
    config.routes.push(route("user-service", "/api/users/**", "user-service"));
    config.instances.push(instance("user-service", backend));
    let gateway = start_gateway(config).await;

    let res = client()
        .post(gateway.url("/api/users"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
}
