// SPDX-License-Identifier: MIT

//! Background ticks that drive the controller once the HTTP surfaces are
//! up: the scheduling cycle and the node-liveness sweep.

use crate::nodecache::NodeCache;
use crate::scheduler::dirty::{CycleCounter, DirtyFlag};
use crate::scheduler::{self, Assignment};
use lightsched_core::{Clock, TaskState};
use lightsched_storage::StateStore;
use lightsched_wire::OutboxMessage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ControlLoopConfig {
    pub scheduler_interval: Duration,
    pub node_sweep_interval: Duration,
    pub offline_threshold_secs: i64,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            scheduler_interval: Duration::from_secs(1),
            node_sweep_interval: Duration::from_secs(31),
            offline_threshold_secs: 30,
        }
    }
}

/// Runs both ticks until `shutdown` fires. Each tick is independent; a
/// failure in one cycle is logged and the loop keeps running rather than
/// taking the whole controller down.
pub async fn run<C: Clock>(
    store: Arc<StateStore<C>>,
    cache: Arc<NodeCache>,
    dirty: Arc<DirtyFlag>,
    cycles: Arc<CycleCounter>,
    config: ControlLoopConfig,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut scheduler_ticker = tokio::time::interval(config.scheduler_interval);
    let mut sweep_ticker = tokio::time::interval(config.node_sweep_interval);

    loop {
        tokio::select! {
            _ = scheduler_ticker.tick() => {
                if dirty.take() {
                    run_scheduler_cycle(&store, &cache, &cycles);
                }
            }
            _ = sweep_ticker.tick() => {
                sweep_unresponsive_nodes(&store, &cache, config.offline_threshold_secs);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("control loop shutting down");
                    break;
                }
            }
        }
    }
}

/// Runs one scheduling cycle and commits its assignments: persists the
/// `Scheduled` tasks, debits the node cache, and queues each `ScheduleTask`
/// outbox message. Exposed (not just used from the background tick) so
/// integration tests can drive a cycle deterministically instead of waiting
/// on the ticker.
pub fn run_scheduler_cycle<C: Clock>(store: &StateStore<C>, cache: &NodeCache, cycles: &CycleCounter) {
    cycles.increment();
    let assignments = scheduler::run_cycle(store, cache.schedulable_nodes());
    if assignments.is_empty() {
        return;
    }

    let mut by_job: std::collections::BTreeMap<lightsched_core::JobId, Vec<Assignment>> =
        std::collections::BTreeMap::new();
    for assignment in assignments {
        if let Ok((job_id, _, _)) = assignment.task_id.parse() {
            by_job.entry(job_id).or_default().push(assignment);
        }
    }

    for (job_id, job_assignments) in by_job {
        let mut updated_tasks = Vec::with_capacity(job_assignments.len());
        for assignment in &job_assignments {
            let Some(mut task) = store.get_task(&assignment.task_id) else {
                warn!(task_id = %assignment.task_id, "scheduled task vanished before commit");
                continue;
            };
            task.state = TaskState::Scheduled;
            task.node_name = Some(assignment.node_name.clone());
            updated_tasks.push(task);
        }
        if let Err(err) = store.save_tasks(&updated_tasks) {
            warn!(%job_id, error = %err, "failed to persist scheduled tasks");
            continue;
        }
        if let Err(err) = store.refresh_job_state(&job_id) {
            warn!(%job_id, error = %err, "failed to refresh job state after scheduling");
        }
        for task in &updated_tasks {
            let Some(node_name) = task.node_name.clone() else {
                continue;
            };
            cache.apply_consumption(&node_name, &task.resources);
            let dispatch = lightsched_wire::TaskDispatch::from(task);
            let content = serde_json::to_value(dispatch).unwrap_or(serde_json::Value::Null);
            cache.append_schedule(&node_name, OutboxMessage::schedule_task(task.id.to_string(), content));
        }
    }
}

/// Requeues tasks stuck on nodes that missed their heartbeat window,
/// refunding nothing on the node side (the node itself is gone from the
/// scheduler's perspective until it re-registers). Exposed for the same
/// testing reason as `run_scheduler_cycle`.
pub fn sweep_unresponsive_nodes<C: Clock>(store: &StateStore<C>, cache: &NodeCache, threshold_secs: i64) {
    let now = store.clock_now();
    let timed_out = cache.check_timeout(threshold_secs, now);
    if timed_out.is_empty() {
        return;
    }

    for node in timed_out {
        warn!(node = %node.name, "node missed its heartbeat window, requeuing its tasks");
        let affected = store.tasks_on_node(&node.name);
        if affected.is_empty() {
            continue;
        }
        let mut by_job: std::collections::BTreeMap<lightsched_core::JobId, Vec<lightsched_core::Task>> =
            std::collections::BTreeMap::new();
        for mut task in affected {
            task.state = TaskState::Queued;
            task.node_name = None;
            task.progress = 0;
            task.start_time = None;
            if let Ok((job_id, _, _)) = task.id.parse() {
                by_job.entry(job_id).or_default().push(task);
            }
        }
        for (job_id, tasks) in by_job {
            if let Err(err) = store.save_tasks(&tasks) {
                warn!(%job_id, error = %err, "failed to requeue tasks after node timeout");
                continue;
            }
            if let Err(err) = store.refresh_job_state(&job_id) {
                warn!(%job_id, error = %err, "failed to refresh job state after node timeout");
            }
        }
    }
}
