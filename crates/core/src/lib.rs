// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lightsched-core: domain model shared by the controller and worker.
//!
//! This crate has no I/O. It defines the entities from the data model
//! (jobs, task groups, tasks, queues, nodes, resources), their state
//! machines, and the `Clock` abstraction used to make time-dependent
//! behavior (heartbeat aging, timeouts) deterministic in tests.

pub mod clock;
pub mod error;
pub mod id;
pub mod job;
pub mod node;
pub mod queue;
pub mod resource;
pub mod task;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{SchedulerError, StoreError};
pub use id::{JobId, TaskGroupId, TaskId};
pub use job::{Job, JobState};
pub use node::{NodeState, WorkNode};
pub use queue::JobQueue;
pub use resource::{ResourceAxis, ResourceSet};
pub use task::{Task, TaskGroup, TaskState};
