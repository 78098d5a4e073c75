// crates/aiops-orchestrator/src/workflow.rs
// ============================================================================
// Module: Incident Workflow
// Description: The 12-step durable workflow driving one incident from
//              evidence collection through verification and closure.
// Purpose: Implement spec.md §5's state machine, bridging every other
//          crate's already-built step logic.
// Dependencies: every other workspace crate, tokio, tracing
// ============================================================================

//! ## Overview
//! `run_workflow` is the one entry point: given an already-persisted
//! [`Incident`], it drives evidence collection, graph assembly, hypothesis
//! generation and ranking, runbook generation, blast-radius scoring,
//! policy evaluation, approval, execution, verification, and incident
//! closure, in that order. Each I/O step runs through
//! [`crate::retry::run_activity`] under the per-activity timeout and retry
//! policy `spec.md` §5 assigns it. Per the REDESIGN FLAGS, durability
//! itself is delegated to an external execution service; this module only
//! owns the in-process sequencing and the [`crate::progress::ProgressTable`]
//! status it exposes while a run is in flight.
//!
//! Only two steps abort the whole run (`WorkflowStatus::Failed`): the
//! initial incident load, and the graph store being unreachable when
//! upserting the incident's own node. Every other step-level failure
//! (policy denial, approval denial, execution failure, verification
//! failure) routes through [`finish_unresolved`], which files a ticket
//! (when a sink is configured) and closes the incident without a
//! confirmed resolution.

use std::sync::Arc;
use std::time::Duration;

use aiops_core::ActionStatus;
use aiops_core::ActionType;
use aiops_core::ApprovalAudit;
use aiops_core::Category;
use aiops_core::CollectionOutcome;
use aiops_core::CollectorContext;
use aiops_core::EntityKind;
use aiops_core::GraphEntity;
use aiops_core::Incident;
use aiops_core::IncidentId;
use aiops_core::IncidentStatus;
use aiops_core::PolicyDecision;
use aiops_core::RelationKind;
use aiops_core::RemediationAction;
use aiops_core::RiskLevel;
use aiops_core::Severity;
use aiops_core::Target;
use aiops_core::TicketRequest;
use aiops_core::TimeWindow;
use aiops_core::Timestamp;
use aiops_core::new_uuid_string;
use aiops_remediation::await_approval;
use aiops_remediation::blast_radius_fail_closed_score;
use aiops_remediation::compute_blast_radius;
use aiops_remediation::verify;
use aiops_rules::generate_hypotheses;
use aiops_rules::rank;

use crate::deps::WorkflowDeps;
use crate::progress::WorkflowStatus;
use crate::retry::ActivityError;
use crate::retry::RetryPolicy;
use crate::retry::run_activity;

/// Errors that abort an incident's workflow run outright, short-circuiting
/// the rest of the steps and leaving the run `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Persistence failed somewhere along the run.
    #[error("incident store: {0}")]
    Store(#[from] aiops_store_sqlite::SqliteStoreError),
    /// The incident named by `submit` does not exist in the store.
    #[error("incident {0} not found")]
    IncidentNotFound(String),
    /// The graph store could not accept the incident's own node.
    #[error("graph store unavailable: {0}")]
    GraphUnavailable(String),
}

/// Environments the blast-radius/policy multiplier table recognizes,
/// matched as a substring of the incident's namespace. Falls back to
/// `"prod"`, the highest-scrutiny multiplier, when nothing matches: an
/// unrecognized namespace should get more scrutiny, not less.
fn derive_environment(namespace: &str) -> &'static str {
    const KNOWN: &[&str] = &["dev", "staging", "uat", "prod"];
    KNOWN.iter().find(|candidate| namespace.contains(*candidate)).copied().unwrap_or("prod")
}

fn severity_to_priority(severity: Severity) -> String {
    match severity {
        Severity::Critical => "P1",
        Severity::High => "P2",
        Severity::Medium => "P3",
        Severity::Low | Severity::Info => "P4",
    }
    .to_string()
}

fn collector_context(incident: &Incident) -> CollectorContext {
    CollectorContext {
        cluster: incident.cluster.as_str().to_string(),
        namespace: incident.namespace.as_str().to_string(),
        service: incident.service.as_ref().map(|service| service.as_str().to_string()),
        window: TimeWindow::new(incident.started_at, Timestamp::now()),
    }
}

/// Runs the full 12-step workflow for an already-persisted incident.
///
/// # Errors
///
/// Returns [`WorkflowError`] only for the two abort conditions described
/// in the module overview; every other step-level failure is handled
/// in-band and recorded on [`crate::progress::ProgressTable`] instead.
pub async fn run_workflow(deps: &WorkflowDeps, incident_id: &IncidentId) -> Result<(), WorkflowError> {
    deps.progress.start(incident_id.clone()).await;

    let Some(mut incident) =
        deps.store.get_incident(incident_id.as_str()).map_err(WorkflowError::Store)?
    else {
        deps.progress.set_status(incident_id, WorkflowStatus::Failed).await;
        return Err(WorkflowError::IncidentNotFound(incident_id.as_str().to_string()));
    };

    let activity_timeout = Duration::from_millis(deps.config.orchestrator.activity_timeout_ms);

    // --- Step 1: evidence collection -----------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::CollectingEvidence).await;
    let outcome = collect_evidence(deps, &incident, activity_timeout).await;
    for error in &outcome.errors {
        deps.progress.push_error(incident_id, error.clone()).await;
    }
    for evidence in &outcome.evidence {
        if let Err(err) = deps.store.put_evidence(evidence) {
            deps.progress.push_error(incident_id, format!("persist evidence failed: {err}")).await;
        }
    }
    deps.progress.set_evidence_count(incident_id, outcome.evidence.len()).await;

    // --- Step 2: graph assembly ------------------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::BuildingGraph).await;
    if let Err(err) = build_graph(deps, &incident, &outcome, activity_timeout).await {
        deps.progress.push_error(incident_id, err.clone()).await;
        deps.progress.set_status(incident_id, WorkflowStatus::Failed).await;
        return Err(WorkflowError::GraphUnavailable(err));
    }

    // --- Step 3: hypothesis generation + ranking ------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::Analyzing).await;
    let mut hypotheses = generate_hypotheses(incident_id, &outcome.evidence);
    rank(&mut hypotheses);
    for hypothesis in &hypotheses {
        if let Err(err) = deps.store.put_hypothesis(hypothesis) {
            deps.progress.push_error(incident_id, format!("persist hypothesis failed: {err}")).await;
        }
    }
    deps.progress.set_hypotheses(incident_id, hypotheses.clone()).await;

    // --- Step 4: runbook generation --------------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::GeneratingRunbook).await;
    if let Some(runbook) =
        aiops_runbook::generate(&incident, &hypotheses, &deps.config.orchestrator.dashboard_base_url)
    {
        match serde_json::to_string(&runbook) {
            Ok(data_json) => {
                if let Err(err) = deps.store.put_runbook(runbook.id.as_str(), incident_id.as_str(), &data_json) {
                    deps.progress.push_error(incident_id, format!("persist runbook failed: {err}")).await;
                }
            }
            Err(err) => deps.progress.push_error(incident_id, format!("serialize runbook failed: {err}")).await,
        }
    }

    let Some(top) = hypotheses.first().cloned() else {
        return finish_unresolved(deps, &mut incident, "no hypothesis produced").await;
    };
    let Some(action_type) = top.recommended_actions.first().copied() else {
        return finish_unresolved(deps, &mut incident, "top hypothesis recommends no action").await;
    };
    if top.category == Category::Unknown {
        return finish_unresolved(deps, &mut incident, "root cause not determined").await;
    }

    // --- Step 5: blast radius + remediation action -----------------------
    let mut action = build_remediation_action(deps, &incident, &top, action_type).await;
    if let Err(err) = deps.store.put_remediation_action(&action) {
        deps.progress.push_error(incident_id, format!("persist remediation action failed: {err}")).await;
    }

    // --- Step 6: policy evaluation ----------------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::EvaluatingPolicy).await;
    let decision = match run_activity(activity_timeout, RetryPolicy::DEFAULT, || {
        deps.policy_client.evaluate(&action)
    })
    .await
    {
        Ok(decision) => decision,
        Err(err) => {
            deps.progress.push_error(incident_id, format!("policy evaluation failed: {err}")).await;
            PolicyDecision::fail_closed("policy gate unreachable")
        }
    };

    if !decision.allow {
        deps.progress.set_status(incident_id, WorkflowStatus::ApprovalDenied).await;
        action.status = ActionStatus::Rejected;
        let _ = deps.store.put_remediation_action(&action);
        let reason = decision.reason.unwrap_or_else(|| "policy denied".to_string());
        return finish_unresolved(deps, &mut incident, &reason).await;
    }

    // --- Step 7: approval ---------------------------------------------------
    if decision.requires_approval {
        action.status = ActionStatus::PendingApproval;
        let _ = deps.store.put_remediation_action(&action);
        let audit = await_approval(&action, deps.chat_sink.as_deref(), &deps.config.approval).await;
        action.approval = audit.clone();
        if audit.approved != Some(true) {
            deps.progress.set_status(incident_id, WorkflowStatus::ApprovalDenied).await;
            action.status = ActionStatus::Rejected;
            let _ = deps.store.put_remediation_action(&action);
            let reason = audit.reason.unwrap_or_else(|| "approval denied".to_string());
            return finish_unresolved(deps, &mut incident, &reason).await;
        }
        action.status = ActionStatus::Approved;
    } else {
        action.approval = ApprovalAudit::not_required();
    }
    let _ = deps.store.put_remediation_action(&action);

    // --- Step 8: execution ---------------------------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::Remediating).await;
    action.status = ActionStatus::Executing;
    let _ = deps.store.put_remediation_action(&action);

    let Some(handler) = deps.action_handlers.get(&action.action_type) else {
        return finish_unresolved(deps, &mut incident, "no handler registered for action type").await;
    };
    let execution = run_activity(activity_timeout, RetryPolicy::DEFAULT, || handler.execute(&action)).await;
    match execution {
        Ok(receipt) if receipt.succeeded => {
            action.status = ActionStatus::Completed;
        }
        Ok(receipt) => {
            action.status = ActionStatus::Failed;
            let _ = deps.store.put_remediation_action(&action);
            return finish_unresolved(deps, &mut incident, &receipt.message).await;
        }
        Err(err) => {
            action.status = ActionStatus::Failed;
            let _ = deps.store.put_remediation_action(&action);
            return finish_unresolved(deps, &mut incident, &format!("execution failed: {err}")).await;
        }
    }
    let _ = deps.store.put_remediation_action(&action);

    // --- Step 9: verification (includes its own mandatory cool-down) -----
    deps.progress.set_status(incident_id, WorkflowStatus::Verifying).await;
    let service = incident.service.as_ref().map(aiops_core::ServiceId::as_str).unwrap_or(&action.target.name);
    let verify_timeout =
        activity_timeout.saturating_add(Duration::from_secs(deps.config.remediation.verification_wait_seconds));
    let verification = tokio::time::timeout(
        verify_timeout,
        verify(
            &deps.metrics_client,
            &deps.cluster_client,
            action.id.clone(),
            incident_id.clone(),
            incident.namespace.as_str(),
            service,
            Timestamp::now().unix_timestamp() as f64,
            deps.config.remediation.verification_wait_seconds,
        ),
    )
    .await;

    match verification {
        Ok(Ok(result)) => {
            let succeeded = result.success;
            if let Err(err) = deps.store.put_verification_result(&result) {
                deps.progress.push_error(incident_id, format!("persist verification failed: {err}")).await;
            }
            if !succeeded {
                action.status = ActionStatus::RolledBack;
                let _ = deps.store.put_remediation_action(&action);
                return finish_unresolved(deps, &mut incident, "verification did not confirm resolution").await;
            }
        }
        Ok(Err(err)) => {
            return finish_unresolved(deps, &mut incident, &format!("verification failed: {err}")).await;
        }
        Err(_elapsed) => {
            return finish_unresolved(deps, &mut incident, "verification timed out").await;
        }
    }

    // --- Step 10/11/12: close as resolved --------------------------------
    deps.progress.set_status(incident_id, WorkflowStatus::Closing).await;
    incident.status = IncidentStatus::Resolved;
    incident.updated_at = Timestamp::now();
    deps.store.put_incident(&incident)?;
    deps.progress.set_status(incident_id, WorkflowStatus::Completed).await;
    Ok(())
}

async fn collect_evidence(deps: &WorkflowDeps, incident: &Incident, timeout: Duration) -> CollectionOutcome {
    let ctx = collector_context(incident);
    let mut tasks = Vec::with_capacity(deps.collectors.len());
    for collector in &deps.collectors {
        let collector = Arc::clone(collector);
        let ctx = ctx.clone();
        let incident = incident.clone();
        tasks.push(async move {
            run_activity(timeout, RetryPolicy::DEFAULT, || collector.collect(&ctx, &incident)).await
        });
    }
    let results = futures::future::join_all(tasks).await;

    let mut combined = CollectionOutcome::default();
    for result in results {
        match result {
            Ok(outcome) => {
                combined.evidence.extend(outcome.evidence);
                combined.entities.extend(outcome.entities);
                combined.relations.extend(outcome.relations);
                combined.errors.extend(outcome.errors);
            }
            Err(err) => combined.errors.push(err.to_string()),
        }
    }
    combined
}

async fn build_graph(
    deps: &WorkflowDeps,
    incident: &Incident,
    outcome: &CollectionOutcome,
    timeout: Duration,
) -> Result<(), String> {
    let incident_entity = GraphEntity {
        id: GraphEntity::incident_node_id(incident.id.as_str()),
        kind: EntityKind::Incident,
        label: EntityKind::Incident.label().to_string(),
        namespace: incident.namespace.as_str().to_string(),
        name: incident.id.as_str().to_string(),
        properties: std::collections::BTreeMap::from([
            ("title".to_string(), incident.title.clone()),
            ("severity".to_string(), format!("{:?}", incident.severity)),
        ]),
    };

    run_activity(timeout, RetryPolicy::DEFAULT, || deps.graph.upsert_entity(&incident_entity))
        .await
        .map_err(|err: ActivityError<_>| err.to_string())?;

    for entity in &outcome.entities {
        if let Err(err) = run_activity(timeout, RetryPolicy::DEFAULT, || deps.graph.upsert_entity(entity)).await {
            deps.progress.push_error(&incident.id, format!("graph entity upsert failed: {err}")).await;
        }
        let affects = aiops_core::GraphRelation {
            from: incident_entity.id.clone(),
            to: entity.id.clone(),
            kind: RelationKind::Affects,
            properties: std::collections::BTreeMap::new(),
        };
        if let Err(err) = run_activity(timeout, RetryPolicy::DEFAULT, || deps.graph.upsert_relation(&affects)).await
        {
            deps.progress.push_error(&incident.id, format!("graph relation upsert failed: {err}")).await;
        }
    }
    for relation in &outcome.relations {
        if let Err(err) = run_activity(timeout, RetryPolicy::DEFAULT, || deps.graph.upsert_relation(relation)).await
        {
            deps.progress.push_error(&incident.id, format!("graph relation upsert failed: {err}")).await;
        }
    }

    Ok(())
}

async fn build_remediation_action(
    deps: &WorkflowDeps,
    incident: &Incident,
    hypothesis: &aiops_core::Hypothesis,
    action_type: ActionType,
) -> RemediationAction {
    let namespace = incident.namespace.as_str();
    let service_name = incident.service.as_ref().map(aiops_core::ServiceId::as_str).unwrap_or(namespace);
    let environment = derive_environment(namespace).to_string();

    let blast_radius_query = tokio::time::timeout(
        Duration::from_millis(deps.config.collectors.cluster_api.request_timeout_ms),
        async {
            let pods = deps.cluster_client.list_pods(namespace, Some(service_name)).await?;
            let deployments = deps.cluster_client.list_deployments(namespace).await?;
            Ok::<_, aiops_collectors::ClusterApiError>((pods.len(), deployments.len()))
        },
    )
    .await;

    let (affected_pods, blast_radius_score) = match blast_radius_query {
        Ok(Ok((pods, deployments))) => {
            let pods_u32 = u32::try_from(pods).unwrap_or(u32::MAX);
            let deployments_u32 = u32::try_from(deployments).unwrap_or(u32::MAX);
            let score = compute_blast_radius(namespace, &environment, pods_u32, deployments_u32);
            (pods_u32, score)
        }
        Ok(Err(err)) => {
            deps.progress
                .push_error(&incident.id, format!("blast radius cluster query failed: {err}"))
                .await;
            (0, blast_radius_fail_closed_score())
        }
        Err(_elapsed) => {
            deps.progress.push_error(&incident.id, "blast radius cluster query timed out".to_string()).await;
            (0, blast_radius_fail_closed_score())
        }
    };

    let proposed_at = Timestamp::now();
    let target = Target {
        cluster: incident.cluster.as_str().to_string(),
        namespace: namespace.to_string(),
        kind: "deployment".to_string(),
        name: service_name.to_string(),
    };
    let idempotency_key =
        RemediationAction::idempotency_key(&incident.id, action_type, &target.name, proposed_at);

    RemediationAction {
        id: new_uuid_string().into(),
        incident_id: incident.id.clone(),
        hypothesis_id: Some(hypothesis.id.clone()),
        action_type,
        target,
        parameters: std::collections::BTreeMap::new(),
        status: ActionStatus::Proposed,
        risk_level: RiskLevel::from_blast_radius(blast_radius_score),
        blast_radius_score,
        affected_replicas: affected_pods,
        environment,
        idempotency_key,
        approval: ApprovalAudit::not_required(),
    }
}

/// Files a ticket (when a sink is configured) and closes the incident
/// without a confirmed resolution. This is the landing spot for every
/// step-level failure that should not abort the whole run: policy denial,
/// approval denial, execution failure, and verification failure all route
/// here.
async fn finish_unresolved(
    deps: &WorkflowDeps,
    incident: &mut Incident,
    reason: &str,
) -> Result<(), WorkflowError> {
    deps.progress.set_status(&incident.id, WorkflowStatus::CreatingTicket).await;
    if let Some(sink) = deps.ticket_sink.as_deref() {
        let request = TicketRequest {
            summary: format!("Unresolved incident: {}", incident.title),
            description: format!("{}\n\nreason: {reason}", incident.title),
            priority: severity_to_priority(incident.severity),
        };
        let timeout = Duration::from_millis(deps.config.ticket.request_timeout_ms);
        match tokio::time::timeout(timeout, sink.create_issue(&request)).await {
            Ok(Ok(_ticket_id)) => {}
            Ok(Err(err)) => {
                deps.progress.push_error(&incident.id, format!("ticket creation failed: {err}")).await;
            }
            Err(_elapsed) => {
                deps.progress.push_error(&incident.id, "ticket creation timed out".to_string()).await;
            }
        }
    }

    deps.progress.set_status(&incident.id, WorkflowStatus::Closing).await;
    incident.status = IncidentStatus::Closed;
    incident.updated_at = Timestamp::now();
    deps.store.put_incident(incident)?;
    deps.progress.set_status(&incident.id, WorkflowStatus::Completed).await;
    Ok(())
}
