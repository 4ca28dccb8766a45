// SPDX-License-Identifier: MIT

//! Tasks and task groups.

use crate::id::{TaskGroupId, TaskId};
use crate::resource::ResourceSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Queued,
    Scheduled,
    Dispatching,
    Executing,
    Completed,
    Failed,
    Aborted,
    Terminated,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Aborted | TaskState::Terminated
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(self, TaskState::Failed | TaskState::Aborted)
    }

    /// Non-terminal states that occupy resources on a node.
    pub fn holds_resources(self) -> bool {
        matches!(self, TaskState::Scheduled | TaskState::Dispatching | TaskState::Executing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub command: String,
    pub args: String,
    pub workdir: String,
    pub envs: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub taints: BTreeMap<String, String>,
    pub resources: ResourceSet,
    pub state: TaskState,
    pub node_name: Option<String>,
    pub progress: i32,
    pub exit_code: Option<i32>,
    pub error: String,
    pub queue_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn group_id(&self) -> Option<TaskGroupId> {
        self.id.group_id()
    }

    /// Appends `message` to the accumulated error text, separated by `;`.
    pub fn append_error(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        if self.error.is_empty() {
            self.error = message.to_string();
        } else {
            self.error.push(';');
            self.error.push_str(message);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroup {
    pub id: TaskGroupId,
    pub name: String,
    pub command: String,
    pub workdir: String,
    pub envs: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub resources: ResourceSet,
    pub dependents: Vec<String>,
    pub tasks: Vec<Task>,
}

impl TaskGroup {
    /// A group is "completed" iff every task in it is `Completed`.
    pub fn is_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.state == TaskState::Completed)
    }
}

/// Merges two string lists, keeping `primary` first and appending entries
/// from `fallback` that aren't already present. Used to merge a task's own
/// env vars with the ones inherited from its group.
pub fn merge_string_lists(primary: &[String], fallback: &[String]) -> Vec<String> {
    let mut merged = primary.to_vec();
    for item in fallback {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Merges two label maps; `primary` entries win on key collision.
pub fn merge_label_maps(
    primary: &BTreeMap<String, String>,
    fallback: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = fallback.clone();
    merged.extend(primary.clone());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::JobId;

    #[test]
    fn append_error_concatenates_with_semicolon() {
        let mut task = sample_task();
        task.append_error("first failure");
        task.append_error("second failure");
        assert_eq!(task.error, "first failure;second failure");
    }

    #[test]
    fn append_error_ignores_empty_message() {
        let mut task = sample_task();
        task.append_error("");
        assert_eq!(task.error, "");
    }

    #[test]
    fn group_completed_requires_all_tasks_completed() {
        let job = JobId::from("job-1");
        let mut group = TaskGroup {
            id: TaskGroupId::new(&job, 0),
            name: "g0".into(),
            command: "true".into(),
            workdir: String::new(),
            envs: Vec::new(),
            labels: BTreeMap::new(),
            resources: ResourceSet::zero(),
            dependents: Vec::new(),
            tasks: vec![sample_task(), sample_task()],
        };
        assert!(!group.is_completed());
        for t in &mut group.tasks {
            t.state = TaskState::Completed;
        }
        assert!(group.is_completed());
    }

    #[test]
    fn empty_group_is_not_completed() {
        let job = JobId::from("job-1");
        let group = TaskGroup {
            id: TaskGroupId::new(&job, 0),
            name: "g0".into(),
            command: String::new(),
            workdir: String::new(),
            envs: Vec::new(),
            labels: BTreeMap::new(),
            resources: ResourceSet::zero(),
            dependents: Vec::new(),
            tasks: Vec::new(),
        };
        assert!(!group.is_completed());
    }

    #[test]
    fn merge_string_lists_dedupes() {
        let primary = vec!["A=1".to_string()];
        let fallback = vec!["A=1".to_string(), "B=2".to_string()];
        assert_eq!(merge_string_lists(&primary, &fallback), vec!["A=1", "B=2"]);
    }

    fn sample_task() -> Task {
        let job = JobId::from("job-1");
        Task {
            id: TaskId::new(&job, 0, 0),
            name: "t0".into(),
            command: "true".into(),
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
}
