// crates/aiops-gateway/tests/api_integration.rs
// ============================================================================
// Test: Gateway Router Integration
// Description: Drives the assembled router directly with `tower::oneshot`,
//              no bound socket.
// Dependencies: aiops-gateway, aiops-orchestrator, aiops-graph, tower, axum
// ============================================================================
#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use aiops_config::AiopsConfig;
use aiops_gateway::build_router;
use aiops_gateway::AppState;
use aiops_graph::InMemoryGraphStore;
use aiops_orchestrator::InProcessDispatcher;
use aiops_orchestrator::WorkflowDeps;
use aiops_store_sqlite::SqliteKeyValueStore;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::Request;
use axum::http::StatusCode;
use metrics_exporter_prometheus::PrometheusBuilder;
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

fn test_config(db_path: &std::path::Path) -> AiopsConfig {
    let contents = format!(
        r#"
[store]
path = "{path}"

[graph]
backend = "in_memory"
"#,
        path = db_path.display(),
    );
    let mut file = NamedTempFile::new().expect("create temp config file");
    file.write_all(contents.as_bytes()).expect("write temp config file");
    AiopsConfig::load(Some(file.path())).expect("load test config")
}

async fn test_app() -> axum::Router {
    let db_file = NamedTempFile::new().expect("create temp db file");
    let config = test_config(db_file.path());
    let graph = Arc::new(InMemoryGraphStore::new());
    let deps = Arc::new(WorkflowDeps::new(config, graph, None).expect("build workflow deps"));
    let kv = Arc::new(SqliteKeyValueStore::new(deps.store.clone()));
    let dispatcher = Arc::new(InProcessDispatcher::new(Arc::clone(&deps)));
    let prometheus =
        PrometheusBuilder::new().build_recorder().handle();
    let gateway = deps.config.gateway.clone();
    let state = Arc::new(AppState { deps, kv, dispatcher, gateway, prometheus });
    build_router(state, true)
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 0))))
}

#[tokio::test]
async fn liveness_returns_ok() {
    let app = test_app().await;
    let response =
        app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_is_healthy_with_in_memory_graph() {
    let app = test_app().await;
    let response =
        app.oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_incident_returns_404() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/api/v1/incidents/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manual_incident_creation_then_lookup() {
    let app = test_app().await;

    let body = serde_json::json!({
        "source": "manual",
        "cluster": "prod-1",
        "status": "firing",
        "labels": {"alertname": "PodCrashLooping", "namespace": "checkout", "pod": "api-7d-xyz"},
        "annotations": {},
        "startsAt": "2026-01-05T05:00:00Z",
    });

    let create_request = Request::builder()
        .method("POST")
        .uri("/api/v1/incidents")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(create_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let incident: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let id = incident["id"].as_str().unwrap().to_string();

    let get_request =
        Request::builder().uri(format!("/api/v1/incidents/{id}")).body(Body::empty()).unwrap();
    let get_response = app.oneshot(get_request).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_manual_incident_returns_conflict() {
    let app = test_app().await;

    let body = serde_json::json!({
        "source": "manual",
        "cluster": "prod-1",
        "status": "firing",
        "labels": {"alertname": "PodCrashLooping", "namespace": "checkout"},
        "annotations": {},
        "startsAt": "2026-01-05T05:00:00Z",
    });

    let first = Request::builder()
        .method("POST")
        .uri("/api/v1/incidents")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let first_response = app.clone().oneshot(first).await.unwrap();
    assert_eq!(first_response.status(), StatusCode::CREATED);

    let second = Request::builder()
        .method("POST")
        .uri("/api/v1/incidents")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let second_response = app.oneshot(second).await.unwrap();
    assert_eq!(second_response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn alertmanager_webhook_accepts_a_batch() {
    let app = test_app().await;

    let payload = serde_json::json!({
        "status": "firing",
        "alerts": [{
            "status": "firing",
            "labels": {"alertname": "HighMemory", "namespace": "billing", "cluster": "prod-2"},
            "annotations": {},
            "startsAt": "2026-01-05T05:00:00Z",
        }],
    });

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/alertmanager")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["incidents_created"], 1);
    assert_eq!(parsed["incidents_deduped"], 0);
}

#[tokio::test]
async fn duplicate_webhook_alert_is_deduplicated_and_counted() {
    let app = test_app().await;

    let payload = serde_json::json!({
        "status": "firing",
        "alerts": [{
            "status": "firing",
            "labels": {"alertname": "PodCrashLooping", "namespace": "default", "pod": "api-7d-xyz", "severity": "critical"},
            "annotations": {},
            "startsAt": "2026-01-05T05:00:00Z",
        }],
    });

    let first = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/alertmanager")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let first_response = app.clone().oneshot(first).await.unwrap();
    assert_eq!(first_response.status(), StatusCode::ACCEPTED);
    let first_bytes = axum::body::to_bytes(first_response.into_body(), usize::MAX).await.unwrap();
    let first_parsed: serde_json::Value = serde_json::from_slice(&first_bytes).unwrap();
    assert_eq!(first_parsed["incidents_created"], 1);
    assert_eq!(first_parsed["incidents_deduped"], 0);

    let second = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/alertmanager")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let second_response = app.clone().oneshot(second).await.unwrap();
    assert_eq!(second_response.status(), StatusCode::ACCEPTED);
    let second_bytes = axum::body::to_bytes(second_response.into_body(), usize::MAX).await.unwrap();
    let second_parsed: serde_json::Value = serde_json::from_slice(&second_bytes).unwrap();
    assert_eq!(second_parsed["incidents_created"], 0);
    assert_eq!(second_parsed["incidents_deduped"], 1);

    let metrics_response =
        app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(metrics_response.status(), StatusCode::OK);
    let metrics_bytes = axum::body::to_bytes(metrics_response.into_body(), usize::MAX).await.unwrap();
    let metrics_text = String::from_utf8(metrics_bytes.to_vec()).unwrap();
    assert!(metrics_text.contains("aiops_alerts_deduplicated_total"));
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = test_app().await;
    let response =
        app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
