// SPDX-License-Identifier: MIT

//! Worker node records.
//!
//! Owned exclusively by the node cache, never the state store: node
//! liveness and available resources change far more often than anything
//! the store persists, and neither survives a controller restart.

use crate::resource::ResourceSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Online,
    Offline,
    Unresponsive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkNode {
    pub name: String,
    pub address: String,
    pub platform: String,
    pub state: NodeState,
    pub online_time: DateTime<Utc>,
    pub last_contact: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
    pub taints: BTreeMap<String, String>,
    /// Total resources declared at registration. Immutable after creation.
    pub resources: ResourceSet,
    pub reserved: ResourceSet,
    /// `resources - reserved`, minus whatever is currently consumed by
    /// non-terminal tasks scheduled onto this node.
    pub available: ResourceSet,
    /// Live utilization reported on the last heartbeat (for diagnostics,
    /// not used in scheduling decisions).
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub executing_count: i32,
}

impl WorkNode {
    pub fn new(
        name: String,
        address: String,
        platform: String,
        resources: ResourceSet,
        reserved: ResourceSet,
        now: DateTime<Utc>,
    ) -> Self {
        let mut available = resources;
        available.cpu_cores_milli -= reserved.cpu_cores_milli;
        available.cpu_frequency -= reserved.cpu_frequency;
        available.memory -= reserved.memory;
        available.gpu_cards -= reserved.gpu_cards;
        available.gpu_memory -= reserved.gpu_memory;
        Self {
            name,
            address,
            platform,
            state: NodeState::Online,
            online_time: now,
            last_contact: now,
            labels: BTreeMap::new(),
            taints: BTreeMap::new(),
            resources,
            reserved,
            available,
            cpu_percent: 0.0,
            mem_percent: 0.0,
            executing_count: 0,
        }
    }

    pub fn is_schedulable(&self) -> bool {
        self.state == NodeState::Online
    }
}
