// SPDX-License-Identifier: MIT

//! HTTP surfaces: a client-facing API (job/task/node CRUD) and a
//! node-facing API (registration, heartbeats), served on separate
//! listeners so a node outage can never starve client requests.

pub mod client_api;
pub mod node_api;

use crate::nodecache::NodeCache;
use crate::scheduler::dirty::{CycleCounter, DirtyFlag};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lightsched_core::{Clock, ResourceSet, StoreError};
use lightsched_storage::{JobWorkspace, StateStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<C: Clock> {
    pub store: Arc<StateStore<C>>,
    pub cache: Arc<NodeCache>,
    pub dirty: Arc<DirtyFlag>,
    pub cycles: Arc<CycleCounter>,
    pub workspace: Arc<JobWorkspace>,
    /// Resources every node holds back for its own agent and the OS,
    /// applied to whatever it advertises when it registers.
    pub reserved: ResourceSet,
}

/// Wraps `StoreError` so handlers can return it directly via `?` and get
/// the status code the error taxonomy already assigns it.
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
