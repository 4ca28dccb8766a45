// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lightsched-storage: the durable state store and its embedded
//! key-value backing, plus the per-job filesystem workspace. Independent
//! of HTTP and of the scheduler.

pub mod error;
pub mod kv;
pub mod state;
pub mod workspace;

pub use error::persistence_err;
pub use kv::{KvError, KvStore, Namespace};
pub use state::StateStore;
pub use workspace::{JobWorkspace, WorkspaceError};
