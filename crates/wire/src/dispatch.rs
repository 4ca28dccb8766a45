// SPDX-License-Identifier: MIT

//! The payload a worker receives for a `ScheduleTask` outbox message:
//! everything the executor needs to run the task without a callback to
//! the controller.

use lightsched_core::Task;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDispatch {
    pub id: String,
    pub command: String,
    pub args: String,
    pub workdir: String,
    pub envs: Vec<String>,
}

impl From<&Task> for TaskDispatch {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            command: task.command.clone(),
            args: task.args.clone(),
            workdir: task.workdir.clone(),
            envs: task.envs.clone(),
        }
    }
}
