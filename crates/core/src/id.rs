// SPDX-License-Identifier: MIT

//! Identifier types.
//!
//! Jobs are keyed by UUID. Task groups and tasks derive their IDs from the
//! owning job so that a prefix scan over the task namespace (`<job_id>.`)
//! enumerates every task belonging to a job without a secondary index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque job identifier, a UUID formatted as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task group identifier: `<job_id>.<group_index>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskGroupId(pub String);

impl TaskGroupId {
    pub fn new(job_id: &JobId, group_idx: usize) -> Self {
        Self(format!("{}.{}", job_id.0, group_idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task identifier: `<job_id>.<group_index>.<task_index>`.
///
/// Always parseable back into its three components via `parse`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskIdParseError {
    #[error("task id \"{0}\" does not have the form <job>.<group>.<task>")]
    MalformedId(String),
    #[error("task id \"{0}\" has a non-numeric group or task index")]
    NonNumericIndex(String),
}

impl TaskId {
    pub fn new(job_id: &JobId, group_idx: usize, task_idx: usize) -> Self {
        Self(format!("{}.{}.{}", job_id.0, group_idx, task_idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn group_id(&self) -> Option<TaskGroupId> {
        let (job, group, _task) = self.parse().ok()?;
        Some(TaskGroupId::new(&job, group))
    }

    /// Parses `<job_id>.<group_idx>.<task_idx>` back into its components.
    ///
    /// The job id itself may contain no dots (UUIDs don't), so the last two
    /// dot-separated segments are always the group and task indices.
    pub fn parse(&self) -> Result<(JobId, usize, usize), TaskIdParseError> {
        parse_task_id(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_task_id(s)?;
        Ok(Self(s.to_string()))
    }
}

fn parse_task_id(s: &str) -> Result<(JobId, usize, usize), TaskIdParseError> {
    let mut parts = s.rsplitn(3, '.');
    let task_idx = parts.next().ok_or_else(|| TaskIdParseError::MalformedId(s.to_string()))?;
    let group_idx = parts.next().ok_or_else(|| TaskIdParseError::MalformedId(s.to_string()))?;
    let job = parts.next().ok_or_else(|| TaskIdParseError::MalformedId(s.to_string()))?;
    if job.is_empty() {
        return Err(TaskIdParseError::MalformedId(s.to_string()));
    }
    let group_idx: usize =
        group_idx.parse().map_err(|_| TaskIdParseError::NonNumericIndex(s.to_string()))?;
    let task_idx: usize =
        task_idx.parse().map_err(|_| TaskIdParseError::NonNumericIndex(s.to_string()))?;
    Ok((JobId(job.to_string()), group_idx, task_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_round_trips() {
        let job = JobId::from("b7e4b3b0-0000-0000-0000-000000000001");
        let id = TaskId::new(&job, 2, 7);
        assert_eq!(id.as_str(), "b7e4b3b0-0000-0000-0000-000000000001.2.7");
        let (job2, g, t) = id.parse().unwrap();
        assert_eq!(job2, job);
        assert_eq!(g, 2);
        assert_eq!(t, 7);
    }

    #[test]
    fn task_id_group_id_matches_group_format() {
        let job = JobId::from("job-1");
        let id = TaskId::new(&job, 3, 0);
        assert_eq!(id.group_id().unwrap(), TaskGroupId::new(&job, 3));
    }

    #[test]
    fn malformed_task_id_rejected() {
        assert!(matches!(
            "not-an-id".parse::<TaskId>(),
            Err(TaskIdParseError::MalformedId(_))
        ));
        assert!(matches!(
            "job.x.0".parse::<TaskId>(),
            Err(TaskIdParseError::NonNumericIndex(_))
        ));
    }
}
