// SPDX-License-Identifier: MIT

//! Named priority buckets that jobs are submitted into.

use serde::{Deserialize, Serialize};

pub const DEFAULT_QUEUE_NAME: &str = "default";

/// A named priority bucket for jobs. The store guarantees at least one
/// queue (`"default"`) always exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueue {
    pub name: String,
    pub enabled: bool,
    pub priority: i32,
}

impl JobQueue {
    pub fn default_queue() -> Self {
        Self { name: DEFAULT_QUEUE_NAME.to_string(), enabled: true, priority: 1000 }
    }
}
