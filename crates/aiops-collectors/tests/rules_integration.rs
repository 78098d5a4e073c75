// crates/aiops-collectors/tests/rules_integration.rs
// ============================================================================
// Test: Collector-to-Rules Integration
// Description: Runs a real collector's emitted Evidence through the rules
//              engine's signal extraction and hypothesis generation, instead
//              of hand-feeding flat json!({...}) that only coincidentally
//              matches the extractor's field names.
// Dependencies: aiops-collectors, aiops-rules, wiremock, tokio
// ============================================================================
#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

use std::collections::BTreeMap;

use aiops_collectors::ClusterApiClient;
use aiops_collectors::ClusterStateCollector;
use aiops_core::Collector;
use aiops_core::CollectorContext;
use aiops_core::Fingerprint;
use aiops_core::Incident;
use aiops_core::IncidentStatus;
use aiops_core::Severity;
use aiops_core::TimeWindow;
use aiops_core::Timestamp;
use aiops_rules::generate_hypotheses;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn test_incident() -> Incident {
    let now = Timestamp::now();
    Incident {
        id: "inc-1".into(),
        fingerprint: Fingerprint::from_hex("a".repeat(32)),
        title: "PodCrashLoopBackOff: checkout-api".into(),
        severity: Severity::High,
        status: IncidentStatus::Open,
        source: "alertmanager".into(),
        cluster: "prod".into(),
        namespace: "checkout".into(),
        service: None,
        labels: BTreeMap::new(),
        annotations: BTreeMap::new(),
        started_at: now,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn crash_looping_pod_evidence_fires_the_crashloop_rule() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "name": "checkout-api-7d9f-abc12",
                "namespace": "checkout",
                "labels": {},
                "phase": "Running",
                "node_name": "node-1",
                "containers": [{
                    "name": "checkout-api",
                    "restart_count": 6,
                    "waiting_reason": "CrashLoopBackOff",
                    "terminated_reason": null,
                    "image": "registry.internal/checkout-api:v42",
                }],
            }],
        })))
        .mount(&mock_server)
        .await;

    // Every other list endpoint the collector calls is left unmocked; wiremock
    // answers with 404 and the collector records a partial-failure error
    // instead of panicking (node listing silently ignores the error).
    let client = ClusterApiClient::new(mock_server.uri(), std::time::Duration::from_secs(5))
        .expect("build cluster api client");
    let collector = ClusterStateCollector::new(client);

    let incident = test_incident();
    let ctx = CollectorContext {
        cluster: incident.cluster.as_str().to_string(),
        namespace: incident.namespace.as_str().to_string(),
        service: incident.service.as_ref().map(|service| service.as_str().to_string()),
        window: TimeWindow::new(incident.started_at, Timestamp::now()),
    };

    let outcome = collector.collect(&ctx, &incident).await.expect("collect succeeds");
    assert!(!outcome.evidence.is_empty(), "collector must emit evidence for the crash-looping pod");

    let hypotheses = generate_hypotheses(&incident.id, &outcome.evidence);
    assert!(
        hypotheses.iter().any(|hypothesis| hypothesis.rule_id.as_deref() == Some("crashloop_no_change")),
        "expected crashloop_no_change to fire from real collector evidence, got: {hypotheses:?}"
    );
    assert!(
        !hypotheses.iter().any(|hypothesis| hypothesis.rule_id.is_none()),
        "real pod evidence must not reduce to the unknown hypothesis"
    );
}
