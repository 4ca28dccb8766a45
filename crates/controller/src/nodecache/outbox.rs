// SPDX-License-Identifier: MIT

//! Per-node outbox: an ordered queue of messages drained on heartbeat.

use lightsched_wire::{OutboxKind, OutboxMessage};

#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<OutboxMessage>,
}

impl Outbox {
    pub fn append_schedule(&mut self, msg: OutboxMessage) {
        self.messages.push(msg);
    }

    /// Queues a `TerminateJob` message and removes any previously-queued
    /// `ScheduleTask` entries whose object ID is prefixed by `job_id.`.
    /// Returns the object IDs (task IDs) that were removed so the caller
    /// can return their resources to the node's available pool.
    pub fn append_terminate(&mut self, job_id: &str) -> Vec<String> {
        let prefix = format!("{job_id}.");
        let mut removed = Vec::new();
        self.messages.retain(|msg| {
            if msg.kind == OutboxKind::ScheduleTask && msg.object.starts_with(&prefix) {
                removed.push(msg.object.clone());
                false
            } else {
                true
            }
        });
        self.messages.push(OutboxMessage::terminate_job(job_id));
        removed
    }

    /// Atomically reads and clears the outbox.
    pub fn drain(&mut self) -> Vec<OutboxMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_terminate_removes_matching_schedule_messages_and_returns_their_ids() {
        let mut outbox = Outbox::default();
        outbox.append_schedule(OutboxMessage::schedule_task("job-1.0.0", serde_json::json!({})));
        outbox.append_schedule(OutboxMessage::schedule_task("job-2.0.0", serde_json::json!({})));
        let removed = outbox.append_terminate("job-1");
        assert_eq!(removed, vec!["job-1.0.0".to_string()]);
        let drained = outbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].object, "job-2.0.0");
        assert_eq!(drained[1].kind, OutboxKind::TerminateJob);
    }

    #[test]
    fn drain_clears_the_outbox() {
        let mut outbox = Outbox::default();
        outbox.append_schedule(OutboxMessage::schedule_task("job-1.0.0", serde_json::json!({})));
        assert_eq!(outbox.drain().len(), 1);
        assert!(outbox.is_empty());
    }
}
