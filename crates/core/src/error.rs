// SPDX-License-Identifier: MIT

//! Error taxonomy.
//!
//! `StoreError` covers validation and conflict failures that the
//! controller's HTTP handlers translate into 4xx responses. `SchedulerError`
//! is used only for internal fit-diagnostics and never crosses the wire.

use crate::job::JobState;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("job name must not be empty")]
    EmptyName,

    #[error("task group \"{0}\" has no tasks")]
    EmptyTaskGroup(String),

    #[error("unknown queue \"{0}\"")]
    UnknownQueue(String),

    #[error("unknown id \"{0}\"")]
    UnknownId(String),

    #[error("duplicate id \"{0}\"")]
    DuplicateId(String),

    #[error("job \"{id}\" cannot be deleted while in state {state:?}")]
    JobNotDeletable { id: String, state: JobState },

    #[error("invalid resource specification: {0}")]
    InvalidResourceSpec(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Maps an error to the HTTP status code the client API responds with.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::EmptyName
            | StoreError::EmptyTaskGroup(_)
            | StoreError::UnknownQueue(_)
            | StoreError::DuplicateId(_)
            | StoreError::InvalidResourceSpec(_)
            | StoreError::JobNotDeletable { .. } => 400,
            StoreError::UnknownId(_) => 404,
            StoreError::Persistence(_) => 500,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SchedulerError {
    #[error("label \"{0}\" missing or mismatched")]
    LabelMismatch(String),

    #[error("node taint \"{0}\" not permitted by task")]
    TaintExcluded(String),

    #[error("insufficient {axis}: need {requested}, node has {available}")]
    InsufficientResource { axis: String, requested: i64, available: i64 },
}
