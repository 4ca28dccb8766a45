// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lightsched-wire: JSON schemas shared between the controller and worker,
//! and between the controller and its CLI client. Every type here is a
//! plain, serde-derived DTO — conversion to/from `lightsched_core` domain
//! types happens on the controller side, never inside this crate.

pub mod dispatch;
pub mod outbox;
pub mod query;
pub mod response;
pub mod submit;

pub use dispatch::TaskDispatch;
pub use outbox::{OutboxKind, OutboxMessage};
pub use query::{JobQuery, SortKey, TaskQuery};
pub use response::{ClusterInfo, JobInfo, NodeInfo, TaskInfo, TaskStatus};
pub use submit::{
    parse_quantity, CpuSpec, GpuSpec, Heartbeat, JobSpec, QuantityParseError, RegisterNode,
    ResourceSpec, TaskGroupSpec, TaskReport, TaskSpec,
};
