// SPDX-License-Identifier: MIT

//! Builders for constructing jobs, task groups and nodes in tests without
//! repeating every field. Exposed to other crates under the `test-support`
//! feature so controller/worker/storage tests can share them.

use crate::id::{JobId, TaskGroupId, TaskId};
use crate::job::{Job, JobState};
use crate::node::{NodeState, WorkNode};
use crate::resource::ResourceSet;
use crate::task::{Task, TaskGroup, TaskState};
use chrono::Utc;
use std::collections::BTreeMap;

/// Builds a `Job` with `group_sizes.len()` groups, each containing
/// `group_sizes[i]` queued tasks, all using default resource requirements.
pub fn job_with_groups(name: &str, group_sizes: &[usize]) -> Job {
    let id = JobId::new();
    let groups = group_sizes
        .iter()
        .enumerate()
        .map(|(g_idx, &count)| task_group(&id, g_idx, count))
        .collect();
    Job {
        id,
        name: name.to_string(),
        queue: "default".to_string(),
        priority: 0,
        labels: BTreeMap::new(),
        taints: BTreeMap::new(),
        max_errors: 0,
        state: JobState::Queued,
        progress: 0,
        submit_time: Utc::now(),
        start_time: None,
        finish_time: None,
        groups,
    }
}

fn task_group(job_id: &JobId, g_idx: usize, count: usize) -> TaskGroup {
    let tasks = (0..count).map(|t_idx| queued_task(job_id, g_idx, t_idx)).collect();
    TaskGroup {
        id: TaskGroupId::new(job_id, g_idx),
        name: format!("group-{g_idx}"),
        command: "true".to_string(),
        workdir: String::new(),
        envs: Vec::new(),
        labels: BTreeMap::new(),
        resources: ResourceSet::default_task_requirement(),
        dependents: Vec::new(),
        tasks,
    }
}

fn queued_task(job_id: &JobId, g_idx: usize, t_idx: usize) -> Task {
    Task {
        id: TaskId::new(job_id, g_idx, t_idx),
        name: format!("task-{g_idx}-{t_idx}"),
        command: "true".to_string(),
        args: String::new(),
        workdir: String::new(),
        envs: Vec::new(),
        labels: BTreeMap::new(),
        taints: BTreeMap::new(),
        resources: ResourceSet::default_task_requirement(),
        state: TaskState::Queued,
        node_name: None,
        progress: 0,
        exit_code: None,
        error: String::new(),
        queue_time: Utc::now(),
        start_time: None,
        finish_time: None,
    }
}

/// Builds an online `WorkNode` with the given total cores/memory and no
/// reservation, ready to be scheduled onto.
pub fn online_node(name: &str, cores: f64, memory_mib: i64) -> WorkNode {
    let resources = ResourceSet::zero().with_cpu_cores(cores);
    let resources = ResourceSet { memory: memory_mib, cpu_frequency: 32000, ..resources };
    let mut node =
        WorkNode::new(name.to_string(), "127.0.0.1:0".to_string(), "linux/amd64".to_string(), resources, ResourceSet::zero(), Utc::now());
    node.state = NodeState::Online;
    node
}
