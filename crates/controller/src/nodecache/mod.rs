// SPDX-License-Identifier: MIT

//! Live worker inventory: registered nodes and their per-node outbox.
//!
//! Owns `WorkNode` and outbox state exclusively; the state store never
//! touches either. Outboxes are sharded into a fixed number of buckets,
//! each behind its own mutex, to keep concurrent heartbeats from
//! contending on a single lock; a node's bucket is `SHA-1(name)[0] mod N`.

pub mod outbox;

use chrono::{DateTime, Utc};
use lightsched_core::{NodeState, ResourceSet, WorkNode};
use lightsched_wire::OutboxMessage;
use outbox::Outbox;
use parking_lot::{Mutex, RwLock};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

pub const DEFAULT_SHARD_COUNT: usize = 64;

pub struct NodeCache {
    nodes: RwLock<HashMap<String, WorkNode>>,
    shards: Vec<Mutex<Outbox>>,
}

fn shard_for(name: &str, shard_count: usize) -> usize {
    let mut hasher = Sha1::new();
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    digest[0] as usize % shard_count
}

impl NodeCache {
    pub fn new(shard_count: usize) -> Self {
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Mutex::new(Outbox::default()));
        }
        Self { nodes: RwLock::new(HashMap::new()), shards }
    }

    fn shard(&self, name: &str) -> &Mutex<Outbox> {
        &self.shards[shard_for(name, self.shards.len())]
    }

    /// Registers (or re-registers, replacing prior state) a node.
    pub fn register(
        &self,
        name: String,
        address: String,
        platform: String,
        resources: ResourceSet,
        reserved: ResourceSet,
        labels: std::collections::BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> WorkNode {
        let mut node = WorkNode::new(name.clone(), address, platform, resources, reserved, now);
        node.labels = labels;
        self.nodes.write().insert(name, node.clone());
        node
    }

    pub fn get(&self, name: &str) -> Option<WorkNode> {
        self.nodes.read().get(name).cloned()
    }

    pub fn list(&self) -> Vec<WorkNode> {
        self.nodes.read().values().cloned().collect()
    }

    pub fn remove(&self, name: &str) -> Option<WorkNode> {
        self.nodes.write().remove(name)
    }

    /// Nodes eligible as scheduling targets, in a stable enumeration order.
    pub fn schedulable_nodes(&self) -> Vec<WorkNode> {
        let nodes = self.nodes.read();
        let mut names: Vec<&String> = nodes.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| nodes.get(name))
            .filter(|n| n.is_schedulable())
            .cloned()
            .collect()
    }

    pub fn set_state(&self, name: &str, state: NodeState) -> bool {
        match self.nodes.write().get_mut(name) {
            Some(node) => {
                node.state = state;
                true
            }
            None => false,
        }
    }

    /// Commits resource consumption decided during a scheduling cycle onto
    /// the live node.
    pub fn apply_consumption(&self, name: &str, req: &ResourceSet) -> bool {
        match self.nodes.write().get_mut(name) {
            Some(node) => {
                let _ = node.available.consume(req);
                true
            }
            None => false,
        }
    }

    pub fn apply_giveback(&self, name: &str, req: &ResourceSet) -> bool {
        match self.nodes.write().get_mut(name) {
            Some(node) => {
                node.available.give_back(req);
                true
            }
            None => false,
        }
    }

    pub fn append_schedule(&self, name: &str, msg: OutboxMessage) {
        self.shard(name).lock().append_schedule(msg);
    }

    /// Queues a `TerminateJob` message for `name`, returning the task IDs
    /// of any `ScheduleTask` entries it displaced, or `None` if the node
    /// is unknown.
    pub fn append_terminate(&self, name: &str, job_id: &str) -> Option<Vec<String>> {
        if self.nodes.read().get(name).is_none() {
            return None;
        }
        Some(self.shard(name).lock().append_terminate(job_id))
    }

    /// Per-heartbeat update: refreshes liveness/utilization counters and
    /// atomically drains the outbox. Returns `None` if the node is not
    /// registered (signals the worker to re-register).
    pub fn periodic_update(
        &self,
        name: &str,
        cpu_percent: f32,
        mem_percent: f32,
        executing_count: i32,
        now: DateTime<Utc>,
    ) -> Option<Vec<OutboxMessage>> {
        {
            let mut nodes = self.nodes.write();
            let node = nodes.get_mut(name)?;
            node.last_contact = now;
            node.cpu_percent = cpu_percent;
            node.mem_percent = mem_percent;
            node.executing_count = executing_count;
        }
        Some(self.shard(name).lock().drain())
    }

    /// Nodes whose last-contact age exceeds `threshold_seconds`,
    /// transitioned to `Unresponsive` as a side effect.
    pub fn check_timeout(&self, threshold_seconds: i64, now: DateTime<Utc>) -> Vec<WorkNode> {
        let mut nodes = self.nodes.write();
        let mut timed_out = Vec::new();
        for node in nodes.values_mut() {
            if node.state == NodeState::Online
                && (now - node.last_contact).num_seconds() > threshold_seconds
            {
                node.state = NodeState::Unresponsive;
                timed_out.push(node.clone());
            }
        }
        timed_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> ResourceSet {
        ResourceSet::zero().with_cpu_cores(4.0)
    }

    #[test]
    fn shard_assignment_is_deterministic() {
        assert_eq!(shard_for("node-a", 64), shard_for("node-a", 64));
    }

    #[test]
    fn register_then_get_round_trips() {
        let cache = NodeCache::new(4);
        cache.register(
            "n1".into(),
            "127.0.0.1:9000".into(),
            "linux".into(),
            resources(),
            ResourceSet::zero(),
            Default::default(),
            Utc::now(),
        );
        assert!(cache.get("n1").is_some());
    }

    #[test]
    fn periodic_update_returns_none_for_unknown_node() {
        let cache = NodeCache::new(4);
        assert!(cache.periodic_update("ghost", 0.0, 0.0, 0, Utc::now()).is_none());
    }

    #[test]
    fn periodic_update_drains_outbox() {
        let cache = NodeCache::new(4);
        cache.register(
            "n1".into(),
            "addr".into(),
            "linux".into(),
            resources(),
            ResourceSet::zero(),
            Default::default(),
            Utc::now(),
        );
        cache.append_schedule("n1", OutboxMessage::schedule_task("job.0.0", serde_json::json!({})));
        let drained = cache.periodic_update("n1", 10.0, 20.0, 1, Utc::now()).unwrap();
        assert_eq!(drained.len(), 1);
        let drained_again = cache.periodic_update("n1", 10.0, 20.0, 1, Utc::now()).unwrap();
        assert!(drained_again.is_empty());
    }

    #[test]
    fn check_timeout_flags_stale_nodes() {
        let cache = NodeCache::new(4);
        let stale_time = Utc::now() - chrono::Duration::seconds(100);
        cache.register(
            "n1".into(),
            "addr".into(),
            "linux".into(),
            resources(),
            ResourceSet::zero(),
            Default::default(),
            stale_time,
        );
        let timed_out = cache.check_timeout(30, Utc::now());
        assert_eq!(timed_out.len(), 1);
        assert_eq!(cache.get("n1").unwrap().state, NodeState::Unresponsive);
    }

    #[test]
    fn append_terminate_returns_none_for_unknown_node() {
        let cache = NodeCache::new(4);
        assert!(cache.append_terminate("ghost", "job-1").is_none());
    }
}
