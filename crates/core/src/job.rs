// SPDX-License-Identifier: MIT

//! Jobs and the job state machine.

use crate::id::JobId;
use crate::task::TaskGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Executing,
    Completed,
    Failed,
    Terminated,
    /// User-set pause; re-entered only from `Queued`.
    Halted,
    /// Drain phase after a user-requested termination, on the way to `Terminated`.
    Terminating,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Terminated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub queue: String,
    pub priority: i32,
    pub labels: BTreeMap<String, String>,
    pub taints: BTreeMap<String, String>,
    pub max_errors: i32,
    pub state: JobState,
    pub progress: i32,
    pub submit_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub groups: Vec<TaskGroup>,
}

impl Job {
    pub fn total_tasks(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum()
    }

    /// Job is eligible for scheduling unless halted, terminating, or already terminal.
    pub fn is_schedulable(&self) -> bool {
        matches!(self.state, JobState::Queued | JobState::Executing)
    }

    /// Recomputes `state` and `progress` from the current task states. Pure
    /// function of the job's own tasks plus whether a terminate request is
    /// in flight; does not touch timestamps beyond what the transition
    /// implies.
    pub fn refresh_state(&mut self, now: DateTime<Utc>) {
        if self.state == JobState::Halted {
            self.progress = self.compute_progress();
            return;
        }

        let total = self.total_tasks();
        let counts = self.task_counts();

        self.progress = self.compute_progress();

        if total > 0 && counts.completed == total {
            self.transition_to(JobState::Completed, now);
            return;
        }

        if counts.waiting == 0 && counts.executing == 0 {
            let next = if counts.terminated > 0 {
                JobState::Terminated
            } else if counts.failed <= self.max_errors as usize {
                JobState::Completed
            } else {
                JobState::Failed
            };
            self.transition_to(next, now);
            return;
        }

        if self.state != JobState::Terminating {
            self.transition_to(JobState::Executing, now);
        }
    }

    fn compute_progress(&self) -> i32 {
        let total = self.total_tasks();
        if total == 0 {
            return 0;
        }
        let completed = self.task_counts().completed;
        ((100 * completed) / total) as i32
    }

    fn task_counts(&self) -> TaskCounts {
        use crate::task::TaskState;
        let mut counts = TaskCounts::default();
        for group in &self.groups {
            for task in &group.tasks {
                match task.state {
                    TaskState::Completed => counts.completed += 1,
                    TaskState::Failed | TaskState::Aborted => counts.failed += 1,
                    TaskState::Terminated => counts.terminated += 1,
                    TaskState::Executing | TaskState::Scheduled | TaskState::Dispatching => {
                        counts.executing += 1
                    }
                    TaskState::Queued => counts.waiting += 1,
                }
            }
        }
        counts
    }

    fn transition_to(&mut self, next: JobState, now: DateTime<Utc>) {
        if self.state == next {
            return;
        }
        if next == JobState::Executing && self.start_time.is_none() {
            self.start_time = Some(now);
        }
        if next.is_terminal() {
            self.finish_time = Some(now);
        }
        self.state = next;
    }
}

#[derive(Default)]
struct TaskCounts {
    waiting: usize,
    executing: usize,
    completed: usize,
    failed: usize,
    terminated: usize,
}
