// SPDX-License-Identifier: MIT

//! Query parameters accepted by the listing endpoints.

use lightsched_core::JobState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Default,
    State,
    Submit,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    pub state: Option<JobState>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub offset: i64,
    /// `-1` means unbounded.
    #[serde(default = "default_limit")]
    pub limits: i64,
}

fn default_limit() -> i64 {
    -1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub jobid: Option<String>,
}
