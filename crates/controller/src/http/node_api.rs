// SPDX-License-Identifier: MIT

//! Routes a worker talks to: registration and heartbeats. Kept on its own
//! listener so client traffic can never crowd out a heartbeat.

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use lightsched_core::{Clock, StoreError, TaskId, TaskState};
use lightsched_wire::{Heartbeat, OutboxMessage, RegisterNode, TaskReport};
use serde::Serialize;

pub fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new()
        .route("/nodes", post(register_node))
        .route("/heartbeat", post(heartbeat))
        .route("/tasks/:id/log", post(append_task_log))
}

async fn register_node<C: Clock>(
    State(state): State<AppState<C>>,
    Json(register): Json<RegisterNode>,
) -> Result<StatusCode, ApiError> {
    let resources = register
        .resources
        .to_resource_set()
        .map_err(|e| StoreError::InvalidResourceSpec(e.to_string()))?;
    state.cache.register(
        register.name,
        String::new(),
        register.platform,
        resources,
        state.reserved,
        register.labels,
        state.store.clock_now(),
    );
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
struct HeartbeatAck {
    messages: Vec<OutboxMessage>,
}

/// Drains the node's outbox in the same request that ingests its task
/// reports, so a worker never has to poll a second endpoint to learn what
/// to run or abort next.
async fn heartbeat<C: Clock>(
    State(state): State<AppState<C>>,
    Json(hb): Json<Heartbeat>,
) -> Result<Json<HeartbeatAck>, ApiError> {
    let now = state.store.clock_now();
    let messages = state
        .cache
        .periodic_update(&hb.name, hb.cpu, hb.memory, hb.executings, now)
        .ok_or_else(|| StoreError::UnknownId(hb.name.clone()))?;

    let mut any_terminal = false;
    for report in &hb.payload {
        if let Err(err) = apply_task_report(&state, report) {
            tracing::warn!(task_id = %report.id, error = %err, "failed to apply task report");
            continue;
        }
        if report_is_terminal(report) {
            any_terminal = true;
        }
    }
    if any_terminal {
        state.dirty.set();
    }

    Ok(Json(HeartbeatAck { messages }))
}

/// Applies one task report and, if it's the report that first drives the
/// task terminal, returns its resources to the node that was running it.
/// Keyed off the task's state *before* the update so an at-least-once
/// retry of the same terminal report never gives back twice.
fn apply_task_report<C: Clock>(state: &AppState<C>, report: &TaskReport) -> Result<(), StoreError> {
    let task_id: TaskId =
        report.id.parse().map_err(|_| StoreError::UnknownId(report.id.clone()))?;
    let task_state = parse_task_state(&report.state)
        .ok_or_else(|| StoreError::InvalidResourceSpec(format!("unknown task state \"{}\"", report.state)))?;
    let previous = state.store.get_task(&task_id);
    state.store.update_task_status(&task_id, task_state, report.progress, report.exit_code, &report.error)?;
    if task_state.is_terminal() {
        if let Some(prev) = previous {
            if !prev.state.is_terminal() {
                if let Some(node_name) = &prev.node_name {
                    state.cache.apply_giveback(node_name, &prev.resources);
                }
            }
        }
    }
    Ok(())
}

fn report_is_terminal(report: &TaskReport) -> bool {
    parse_task_state(&report.state).map(|s| s.is_terminal()).unwrap_or(false)
}

fn parse_task_state(s: &str) -> Option<TaskState> {
    match s {
        "Queued" => Some(TaskState::Queued),
        "Scheduled" => Some(TaskState::Scheduled),
        "Dispatching" => Some(TaskState::Dispatching),
        "Executing" => Some(TaskState::Executing),
        "Completed" => Some(TaskState::Completed),
        "Failed" => Some(TaskState::Failed),
        "Aborted" => Some(TaskState::Aborted),
        "Terminated" => Some(TaskState::Terminated),
        _ => None,
    }
}

async fn append_task_log<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let task_id: TaskId = id.parse().map_err(|_| StoreError::UnknownId(id.clone()))?;
    let (job_id, group_idx, task_idx) =
        task_id.parse().map_err(|_| StoreError::UnknownId(id.clone()))?;
    state
        .workspace
        .append_task_log(job_id.as_str(), group_idx, task_idx, &body)
        .map_err(|e| StoreError::Persistence(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_task_states() {
        assert_eq!(parse_task_state("Executing"), Some(TaskState::Executing));
        assert_eq!(parse_task_state("Completed"), Some(TaskState::Completed));
        assert_eq!(parse_task_state("bogus"), None);
    }

    #[test]
    fn terminal_states_are_detected_from_the_wire_string() {
        let report = TaskReport {
            id: "job.0.0".into(),
            state: "Failed".into(),
            progress: 100,
            exit_code: Some(1),
            error: "boom".into(),
        };
        assert!(report_is_terminal(&report));
    }
}
