// crates/aiops-gateway/src/routes/webhooks.rs
// ============================================================================
// Module: Alert Webhook Routes
// Description: Alertmanager and Grafana ingest endpoints (`spec.md` §6).
// Purpose: Rate-limit, normalize, deduplicate, persist, and dispatch inbound
//          alerts; both webhooks share one pipeline since Grafana's payload
//          is alertmanager-shaped plus a `commonLabels`/`commonAnnotations`
//          envelope.
// Dependencies: aiops-broker, axum
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aiops_broker::AlertmanagerPayload;
use aiops_broker::dedup;
use aiops_broker::ingest::merge_common_fields;
use aiops_broker::ingest::normalize_alert;
use aiops_broker::rate_limit;
use aiops_broker::RateLimitOutcome;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use metrics::counter;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Grafana's webhook envelope: alertmanager-shaped alerts plus batch-level
/// common labels/annotations that get merged into each alert.
#[derive(Debug, Deserialize)]
pub struct GrafanaPayload {
    #[serde(default)]
    pub status: String,
    pub alerts: Vec<aiops_broker::RawAlert>,
    #[serde(rename = "commonLabels", default)]
    pub common_labels: BTreeMap<String, String>,
    #[serde(rename = "commonAnnotations", default)]
    pub common_annotations: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub incidents_created: usize,
    pub incidents_deduped: usize,
    pub incident_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitedResponse {
    pub status: &'static str,
}

pub async fn alertmanager_webhook(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(payload): Json<AlertmanagerPayload>,
) -> impl IntoResponse {
    ingest(&state, peer, "alertmanager", payload).await
}

pub async fn grafana_webhook(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(payload): Json<GrafanaPayload>,
) -> impl IntoResponse {
    let merged = merge_common_fields(
        AlertmanagerPayload { status: payload.status, alerts: payload.alerts },
        &payload.common_labels,
        &payload.common_annotations,
    );
    ingest(&state, peer, "grafana", merged).await
}

async fn ingest(
    state: &Arc<AppState>,
    peer: SocketAddr,
    source: &str,
    payload: AlertmanagerPayload,
) -> axum::response::Response {
    let rate_key = peer.ip().to_string();
    let limit = rate_limit::check_and_increment(
        state.kv.as_ref(),
        &rate_key,
        state.gateway.rate_limit_max_requests,
        Duration::from_secs(state.gateway.rate_limit_window_seconds),
    )
    .await;
    if matches!(limit, RateLimitOutcome::Limited) {
        return (StatusCode::TOO_MANY_REQUESTS, Json(RateLimitedResponse { status: "rate_limited" }))
            .into_response();
    }

    let dedup_ttl = Duration::from_secs(state.gateway.dedup_ttl_seconds);
    let mut created = Vec::new();
    let mut deduped = 0usize;

    for alert in &payload.alerts {
        let cluster =
            alert.labels.get("cluster").cloned().unwrap_or_else(|| state.gateway.cluster.clone());
        let incident = normalize_alert(alert, source, &cluster);

        match dedup::check_duplicate(state.kv.as_ref(), &incident.fingerprint).await {
            aiops_broker::DedupOutcome::Duplicate(existing_id) => {
                deduped += 1;
                counter!("aiops_alerts_deduplicated_total", "source" => source.to_string()).increment(1);
                created.push(existing_id.as_str().to_string());
            }
            aiops_broker::DedupOutcome::New => {
                if let Err(err) = state.deps.store.put_incident(&incident) {
                    warn!(error = %err, incident_id = %incident.id.as_str(), "failed to persist incident");
                    continue;
                }
                dedup::register_with_ttl(state.kv.as_ref(), &incident.fingerprint, &incident.id, dedup_ttl)
                    .await;
                aiops_broker::dispatch::dispatch_best_effort(state.dispatcher.as_ref(), &incident.id).await;
                created.push(incident.id.as_str().to_string());
            }
        }
    }

    let response = IngestResponse {
        status: "accepted",
        incidents_created: created.len() - deduped,
        incidents_deduped: deduped,
        incident_ids: created,
    };
    (StatusCode::ACCEPTED, Json(response)).into_response()
}
