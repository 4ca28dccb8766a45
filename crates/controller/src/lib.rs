// SPDX-License-Identifier: MIT

//! The LightSched controller: state store, live node inventory, scheduler,
//! and the two HTTP surfaces built on top of them.

pub mod config;
pub mod control_loop;
pub mod http;
pub mod nodecache;
pub mod scheduler;

pub use config::{Cli, Config, ConfigError};
pub use control_loop::{run_scheduler_cycle, sweep_unresponsive_nodes, ControlLoopConfig};
pub use nodecache::NodeCache;
pub use scheduler::dirty::{CycleCounter, DirtyFlag};
