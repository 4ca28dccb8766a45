// SPDX-License-Identifier: MIT

//! The scheduling cycle: matches queued tasks against available node
//! capacity and decides where each one runs.
//!
//! Runs against a point-in-time snapshot — queues and jobs read from the
//! state store, nodes cloned out of the node cache — and never mutates
//! either directly. The caller commits the returned assignments.

pub mod dirty;
pub mod fit;

use lightsched_core::{Clock, Job, Task, TaskState, WorkNode};
use lightsched_storage::StateStore;
use lightsched_wire::SortKey;

/// One task placed onto one node by a cycle.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub task_id: lightsched_core::TaskId,
    pub node_name: String,
    pub resources: lightsched_core::ResourceSet,
}

/// Runs one full cycle and returns every assignment it decided on. Does
/// not touch the store or the node cache; `node_pool` is consumed
/// (resources are debited in place as tasks are placed) so callers can
/// tell how much headroom is left after the cycle without re-querying.
pub fn run_cycle<C: Clock>(store: &StateStore<C>, mut node_pool: Vec<WorkNode>) -> Vec<Assignment> {
    node_pool.sort_by(|a, b| a.name.cmp(&b.name));
    let mut assignments = Vec::new();

    for queue in store.schedulable_queues() {
        let jobs: Vec<Job> = store
            .query_jobs(None, SortKey::Default, 0, -1)
            .into_iter()
            .filter(|j| j.queue == queue.name && j.is_schedulable())
            .collect();

        let mut priorities: Vec<i32> = jobs.iter().map(|j| j.priority).collect();
        priorities.sort_unstable_by(|a, b| b.cmp(a));
        priorities.dedup();

        for priority in priorities {
            let bucket: Vec<&Job> = jobs.iter().filter(|j| j.priority == priority).collect();
            let mut per_job_tasks: Vec<Vec<&Task>> =
                bucket.iter().map(|job| schedulable_tasks(job)).collect();
            for tasks in &mut per_job_tasks {
                // Stable sort: GPU-requiring tasks go first, ties keep queue order.
                tasks.sort_by_key(|t| !t.resources.uses_gpu());
            }

            // Round-robin: one task per job per pass, so no single job in a
            // priority bucket can starve its siblings of capacity.
            loop {
                let mut placed_any = false;
                for tasks in &mut per_job_tasks {
                    if tasks.is_empty() {
                        continue;
                    }
                    let task = tasks.remove(0);
                    placed_any = true;
                    if let Some(idx) = pick_node(&node_pool, task) {
                        let node = &mut node_pool[idx];
                        let _ = node.available.consume(&task.resources);
                        assignments.push(Assignment {
                            task_id: task.id.clone(),
                            node_name: node.name.clone(),
                            resources: task.resources,
                        });
                    }
                }
                if !placed_any {
                    break;
                }
            }
        }
    }

    assignments
}

/// Tasks that are `Queued` and whose owning group has every dependent
/// group (by name) already completed.
fn schedulable_tasks(job: &Job) -> Vec<&Task> {
    let mut out = Vec::new();
    for group in &job.groups {
        let ready = group.dependents.iter().all(|dep_name| {
            job.groups.iter().find(|g| &g.name == dep_name).map(|g| g.is_completed()).unwrap_or(true)
        });
        if !ready {
            continue;
        }
        out.extend(group.tasks.iter().filter(|t| t.state == TaskState::Queued));
    }
    out
}

/// Highest-scoring node that fits `task`, or `None` if no node in the
/// (already partly-consumed) pool has room.
fn pick_node(node_pool: &[WorkNode], task: &Task) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, node) in node_pool.iter().enumerate() {
        if fit::fits(node, task).is_err() {
            continue;
        }
        let candidate_score = fit::score(node, task);
        match best {
            Some((_, best_score)) if candidate_score <= best_score => {}
            _ => best = Some((idx, candidate_score)),
        }
    }
    best.map(|(idx, _)| idx)
}
