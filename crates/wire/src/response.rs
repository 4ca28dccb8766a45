// SPDX-License-Identifier: MIT

//! Read-side response envelopes returned by the client API.

use lightsched_core::{Job, JobState, NodeState, Task, WorkNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: String,
    pub cycle: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub queue: String,
    pub priority: i32,
    pub state: JobState,
    pub progress: i32,
    pub total_tasks: usize,
    pub submit_time: chrono::DateTime<chrono::Utc>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub finish_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Job> for JobInfo {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            name: job.name.clone(),
            queue: job.queue.clone(),
            priority: job.priority,
            state: job.state,
            progress: job.progress,
            total_tasks: job.total_tasks(),
            submit_time: job.submit_time,
            start_time: job.start_time,
            finish_time: job.finish_time,
        }
    }
}

/// Full task detail, returned by `GET /tasks/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub name: String,
    pub command: String,
    pub args: String,
    pub state: lightsched_core::TaskState,
    pub node_name: Option<String>,
    pub progress: i32,
    pub exit_code: Option<i32>,
    pub error: String,
    pub queue_time: chrono::DateTime<chrono::Utc>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub finish_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            command: task.command.clone(),
            args: task.args.clone(),
            state: task.state,
            node_name: task.node_name.clone(),
            progress: task.progress,
            exit_code: task.exit_code,
            error: task.error.clone(),
            queue_time: task.queue_time,
            start_time: task.start_time,
            finish_time: task.finish_time,
        }
    }
}

/// The terse status form, returned by `GET /tasks?jobid=` and `GET
/// /tasks/:id?status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: String,
    pub state: lightsched_core::TaskState,
    pub progress: i32,
    pub node_name: Option<String>,
}

impl From<&Task> for TaskStatus {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            state: task.state,
            progress: task.progress,
            node_name: task.node_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub address: String,
    pub platform: String,
    pub state: NodeState,
    pub online_time: chrono::DateTime<chrono::Utc>,
    pub last_contact: chrono::DateTime<chrono::Utc>,
    pub labels: BTreeMap<String, String>,
    pub taints: BTreeMap<String, String>,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub executing_count: i32,
}

impl From<&WorkNode> for NodeInfo {
    fn from(node: &WorkNode) -> Self {
        Self {
            name: node.name.clone(),
            address: node.address.clone(),
            platform: node.platform.clone(),
            state: node.state,
            online_time: node.online_time,
            last_contact: node.last_contact,
            labels: node.labels.clone(),
            taints: node.taints.clone(),
            cpu_percent: node.cpu_percent,
            mem_percent: node.mem_percent,
            executing_count: node.executing_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightsched_core::test_support::{job_with_groups, online_node};

    #[test]
    fn job_info_reports_total_tasks() {
        let job = job_with_groups("demo", &[2, 3]);
        let info = JobInfo::from(&job);
        assert_eq!(info.total_tasks, 5);
        assert_eq!(info.state, JobState::Queued);
    }

    #[test]
    fn node_info_mirrors_identity_fields() {
        let node = online_node("n0", 4.0, 8192);
        let info = NodeInfo::from(&node);
        assert_eq!(info.name, "n0");
        assert_eq!(info.state, NodeState::Online);
    }
}
