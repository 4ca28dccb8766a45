// SPDX-License-Identifier: MIT

//! lightsched-worker: the node agent. Registers with the controller,
//! reports host capacity, executes dispatched tasks, and streams their
//! status back over periodic heartbeats.

pub mod client;
pub mod config;
pub mod executor;
pub mod loop_;
pub mod probe;

pub use client::{ClientError, ControllerClient};
pub use config::{Cli, Config, ConfigError};
pub use loop_::{PendingReports, WorkerLoop, WorkerState};
pub use probe::{current_load, GpuFacts, HostFacts, HostProbe, SystemProbe};
