// SPDX-License-Identifier: MIT

//! Routes a human or the CLI talks to: job submission, inspection,
//! termination, and node visibility/admin.

use super::{ApiError, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use lightsched_core::{Clock, JobId, JobState, NodeState, StoreError, TaskId, TaskState};
use lightsched_wire::{ClusterInfo, JobInfo, JobQuery, JobSpec, NodeInfo, TaskInfo, TaskQuery, TaskStatus};
use std::collections::BTreeSet;

pub fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new()
        .route("/cluster", get(cluster_info))
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/:id", get(get_job).delete(delete_job))
        .route("/jobs/:id/_terminate", put(terminate_job))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/log", get(get_task_log))
        .route("/nodes", get(list_nodes))
        .route("/nodes/:name", get(get_node))
        .route("/nodes/:name/_online", put(online_node))
        .route("/nodes/:name/_offline", put(offline_node))
}

async fn cluster_info<C: Clock>(State(state): State<AppState<C>>) -> Json<ClusterInfo> {
    Json(ClusterInfo { id: "lightsched".to_string(), cycle: state.cycles.get() })
}

fn list_or_not_found<T: serde::Serialize>(items: Vec<T>) -> (StatusCode, Json<Vec<T>>) {
    if items.is_empty() {
        (StatusCode::NOT_FOUND, Json(items))
    } else {
        (StatusCode::OK, Json(items))
    }
}

async fn list_jobs<C: Clock>(
    State(state): State<AppState<C>>,
    Query(query): Query<JobQuery>,
) -> (StatusCode, Json<Vec<JobInfo>>) {
    let jobs = state.store.query_jobs(query.state, query.sort, query.offset, query.limits);
    list_or_not_found(jobs.iter().map(JobInfo::from).collect())
}

async fn get_job<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let job_id = JobId::from(id);
    let job = state.store.get_job(&job_id).ok_or_else(|| StoreError::UnknownId(job_id.to_string()))?;
    Ok(Json(JobInfo::from(&job)))
}

async fn submit_job<C: Clock>(
    State(state): State<AppState<C>>,
    Json(spec): Json<JobSpec>,
) -> Result<(StatusCode, Json<JobInfo>), ApiError> {
    let job = state.store.add_job(&spec)?;
    if let Err(err) = state.workspace.write_job_content(job.id.as_str(), &spec) {
        tracing::warn!(job_id = %job.id, error = %err, "failed to write job workspace content");
    }
    state.dirty.set();
    Ok((StatusCode::CREATED, Json(JobInfo::from(&job))))
}

async fn delete_job<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let job_id = JobId::from(id);
    state.store.delete_job(&job_id)?;
    if let Err(err) = state.workspace.remove_job_dir(job_id.as_str()) {
        tracing::warn!(job_id = %job_id, error = %err, "failed to remove job workspace directory");
    }
    Ok(StatusCode::OK)
}

/// Marks the job `Terminating`, immediately finalizes any task that never
/// left the queue or was still waiting in a node's outbox, and pushes a
/// `TerminateJob` message to every node with a task still running so the
/// worker can abort it and report back on its next heartbeat.
async fn terminate_job<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let job_id = JobId::from(id);
    let job = state.store.get_job(&job_id).ok_or_else(|| StoreError::UnknownId(job_id.to_string()))?;
    state.store.set_job_state(&job_id, JobState::Terminating)?;

    let mut notified_nodes = BTreeSet::new();
    let mut to_finalize = Vec::new();

    for group in &job.groups {
        for task in &group.tasks {
            let Some(node_name) = task.node_name.clone() else { continue };
            if !task.state.holds_resources() || !notified_nodes.insert(node_name.clone()) {
                continue;
            }
            let Some(removed_ids) = state.cache.append_terminate(&node_name, job_id.as_str()) else {
                continue;
            };
            for removed in removed_ids {
                let Ok(removed_id) = removed.parse::<TaskId>() else { continue };
                let Some(removed_task) = state.store.get_task(&removed_id) else { continue };
                state.cache.apply_giveback(&node_name, &removed_task.resources);
                to_finalize.push(removed_task);
            }
        }
    }

    for group in &job.groups {
        for task in &group.tasks {
            if task.state == TaskState::Queued {
                to_finalize.push(task.clone());
            }
        }
    }
    for task in &mut to_finalize {
        task.state = TaskState::Terminated;
    }
    if !to_finalize.is_empty() {
        state.store.save_tasks(&to_finalize)?;
    }
    state.store.refresh_job_state(&job_id)?;
    Ok(StatusCode::ACCEPTED)
}

async fn list_tasks<C: Clock>(
    State(state): State<AppState<C>>,
    Query(query): Query<TaskQuery>,
) -> (StatusCode, Json<Vec<TaskStatus>>) {
    let jobs = match &query.jobid {
        Some(id) => state.store.get_job(&JobId::from(id.as_str())).into_iter().collect(),
        None => state.store.query_jobs(None, Default::default(), 0, -1),
    };
    let statuses = jobs
        .iter()
        .flat_map(|job| job.groups.iter())
        .flat_map(|group| group.tasks.iter())
        .map(TaskStatus::from)
        .collect();
    list_or_not_found(statuses)
}

async fn get_task<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<TaskInfo>, ApiError> {
    let task_id: TaskId = id.parse().map_err(|_| StoreError::UnknownId(id.clone()))?;
    let task = state.store.get_task(&task_id).ok_or_else(|| StoreError::UnknownId(id.clone()))?;
    Ok(Json(TaskInfo::from(&task)))
}

async fn get_task_log<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let task_id: TaskId = id.parse().map_err(|_| StoreError::UnknownId(id.clone()))?;
    let (job_id, group_idx, task_idx) =
        task_id.parse().map_err(|_| StoreError::UnknownId(id.clone()))?;
    Ok(state
        .workspace
        .read_task_log(job_id.as_str(), group_idx, task_idx)
        .unwrap_or_default())
}

async fn list_nodes<C: Clock>(State(state): State<AppState<C>>) -> (StatusCode, Json<Vec<NodeInfo>>) {
    list_or_not_found(state.cache.list().iter().map(NodeInfo::from).collect())
}

async fn get_node<C: Clock>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<Json<NodeInfo>, ApiError> {
    let node = state.cache.get(&name).ok_or_else(|| StoreError::UnknownId(name.clone()))?;
    Ok(Json(NodeInfo::from(&node)))
}

async fn online_node<C: Clock>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.cache.set_state(&name, NodeState::Online) {
        state.dirty.set();
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StoreError::UnknownId(name).into())
    }
}

async fn offline_node<C: Clock>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.cache.set_state(&name, NodeState::Offline) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StoreError::UnknownId(name).into())
    }
}
