// crates/aiops-gateway/src/routes/incidents.rs
// ============================================================================
// Module: Incident Query & Manual Creation Routes
// Description: `spec.md` §6 incident CRUD-ish surface: manual creation,
//              lookup, listing, and the dependency graph neighborhood.
// Purpose: Expose the SQLite store and graph store over REST.
// Dependencies: aiops-broker, aiops-store-sqlite, aiops-core, axum
// ============================================================================

use std::sync::Arc;

use aiops_broker::RawAlert;
use aiops_broker::ingest::normalize_alert;
use aiops_core::IncidentStatus;
use aiops_core::Severity;
use aiops_store_sqlite::IncidentFilters;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Manual incident creation request; flattens a `RawAlert` so callers can
/// post the same shape the webhooks accept, plus an explicit source.
#[derive(Debug, Deserialize)]
pub struct ManualIncidentRequest {
    #[serde(default = "default_manual_source")]
    pub source: String,
    pub cluster: String,
    #[serde(flatten)]
    pub alert: RawAlert,
}

fn default_manual_source() -> String {
    "manual".to_string()
}

pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ManualIncidentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let incident = normalize_alert(&request.alert, &request.source, &request.cluster);

    if let Some(existing) = state.deps.store.find_incident_by_fingerprint(incident.fingerprint.as_str())? {
        return Err(ApiError::Conflict(format!("incident {} already open for this fingerprint", existing.id.as_str())));
    }

    state.deps.store.put_incident(&incident)?;
    aiops_broker::dispatch::dispatch_best_effort(state.dispatcher.as_ref(), &incident.id).await;

    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let incident = state.deps.store.get_incident(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(incident))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListIncidentsQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub namespace: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListIncidentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_status(raw))
        .transpose()?;
    let severity = query.severity.as_deref().map(Severity::from_raw);

    let filters =
        IncidentFilters { status, severity, namespace: query.namespace, limit: query.limit, offset: query.offset };
    let incidents = state.deps.store.list_incidents(&filters)?;
    Ok(Json(incidents))
}

fn parse_status(raw: &str) -> Result<IncidentStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("invalid status: {raw}")))
}

#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_depth() -> u32 {
    2
}

#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub entities: Vec<aiops_core::GraphEntity>,
    pub relations: Vec<aiops_core::GraphRelation>,
}

pub async fn get_incident_graph(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<GraphQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.deps.store.get_incident(&id)?.ok_or(ApiError::NotFound)?;
    let incident_id = aiops_core::IncidentId::new(id);
    let (entities, relations) = state.deps.graph.neighborhood(&incident_id, query.depth).await?;
    Ok(Json(GraphResponse { entities, relations }))
}

#[derive(Debug, Serialize)]
pub struct HypothesesResponse {
    pub hypotheses: Vec<aiops_core::Hypothesis>,
    pub evidence_count: usize,
    pub status: Option<aiops_orchestrator::WorkflowStatus>,
}

pub async fn get_incident_hypotheses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.deps.store.get_incident(&id)?.ok_or(ApiError::NotFound)?;
    let incident_id = aiops_core::IncidentId::new(id);
    let hypotheses = state.deps.progress.hypotheses(&incident_id).await;
    let status = state.deps.progress.status(&incident_id).await;
    let evidence_count = state.deps.progress.evidence_count(&incident_id).await;
    Ok(Json(HypothesesResponse { hypotheses, evidence_count, status }))
}
