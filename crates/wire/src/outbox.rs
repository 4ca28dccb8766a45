// SPDX-License-Identifier: MIT

//! Messages queued per node and drained on heartbeat.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OutboxKind {
    ScheduleTask,
    TerminateJob,
}

/// `object` is an opaque ID that `content` refers to: a task ID for
/// `ScheduleTask`, a job ID for `TerminateJob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub kind: OutboxKind,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl OutboxMessage {
    pub fn schedule_task(task_id: impl Into<String>, content: serde_json::Value) -> Self {
        Self { kind: OutboxKind::ScheduleTask, object: task_id.into(), content: Some(content) }
    }

    pub fn terminate_job(job_id: impl Into<String>) -> Self {
        Self { kind: OutboxKind::TerminateJob, object: job_id.into(), content: None }
    }
}
