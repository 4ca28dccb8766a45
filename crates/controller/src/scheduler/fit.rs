// SPDX-License-Identifier: MIT

//! Per-task, per-node fit checking and scoring.

use lightsched_core::{Task, WorkNode};

/// A task fits a node iff every label it requires matches, no disallowed
/// node taint is present, and the node's available resources (the
/// cycle-local snapshot, not the live pool) cover every requested axis.
pub fn fits(node: &WorkNode, task: &Task) -> Result<(), String> {
    for (key, value) in &task.labels {
        match node.labels.get(key) {
            Some(node_value) if node_value == value => {}
            _ => return Err(format!("label \"{key}\" missing or mismatched")),
        }
    }
    for (key, value) in &node.taints {
        match task.taints.get(key) {
            Some(allowed) if allowed == value => {}
            _ => return Err(format!("node taint \"{key}\" not permitted by task")),
        }
    }
    node.available.fits_detailed(&task.resources)
}

/// Higher is better; only called on nodes that already passed `fits`.
pub fn score(node: &WorkNode, task: &Task) -> f64 {
    let total = &node.resources;
    let avail = &node.available;

    let cpu_ratio = if task.resources.uses_cores() {
        ratio(avail.cpu_cores_milli, total.cpu_cores_milli)
    } else {
        ratio(avail.cpu_frequency, total.cpu_frequency)
    };
    let min_freq_norm = total.cpu_min_freq as f64 / 2400.0;
    let cpu_part = cpu_ratio * 3.0 * min_freq_norm;

    let mem_part = ratio(avail.memory, total.memory);

    let gpu_part = if task.resources.uses_gpu() {
        let gpu_card_ratio = ratio(avail.gpu_cards, total.gpu_cards);
        let total_gpu_mem_gib = total.gpu_memory as f64 / 1024.0;
        gpu_card_ratio * 5.0 * (total_gpu_mem_gib / 8.0)
    } else {
        0.0
    };

    cpu_part + mem_part + gpu_part
}

fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightsched_core::test_support::online_node;
    use lightsched_core::ResourceSet;
    use std::collections::BTreeMap;

    fn task_with(resources: ResourceSet, labels: BTreeMap<String, String>) -> Task {
        let job = lightsched_core::JobId::from("job-1");
        Task {
            id: lightsched_core::TaskId::new(&job, 0, 0),
            name: "t".into(),
            command: "true".into(),
            args: String::new(),
            workdir: String::new(),
            envs: Vec::new(),
            labels,
            taints: BTreeMap::new(),
            resources,
            state: lightsched_core::TaskState::Queued,
            node_name: None,
            progress: 0,
            exit_code: None,
            error: String::new(),
            queue_time: chrono::Utc::now(),
            start_time: None,
            finish_time: None,
        }
    }

    #[test]
    fn fits_rejects_missing_label() {
        let node = online_node("n1", 4.0, 8192);
        let mut labels = BTreeMap::new();
        labels.insert("zone".to_string(), "us-east".to_string());
        let task = task_with(ResourceSet::default_task_requirement(), labels);
        assert!(fits(&node, &task).is_err());
    }

    #[test]
    fn fits_rejects_node_taint_not_permitted() {
        let mut node = online_node("n1", 4.0, 8192);
        node.taints.insert("dedicated".to_string(), "gpu".to_string());
        let task = task_with(ResourceSet::default_task_requirement(), BTreeMap::new());
        assert!(fits(&node, &task).is_err());
    }

    #[test]
    fn fits_accepts_matching_taint() {
        let mut node = online_node("n1", 4.0, 8192);
        node.taints.insert("dedicated".to_string(), "gpu".to_string());
        let mut task = task_with(ResourceSet::default_task_requirement(), BTreeMap::new());
        task.taints.insert("dedicated".to_string(), "gpu".to_string());
        assert!(fits(&node, &task).is_ok());
    }

    #[test]
    fn higher_frequency_node_scores_higher() {
        let mut fast = online_node("fast", 8.0, 16384);
        fast.resources.cpu_frequency = 24000;
        fast.available.cpu_frequency = 24000;
        fast.resources.cpu_min_freq = 3000;
        fast.available.cpu_min_freq = 3000;

        let mut slow = online_node("slow", 8.0, 16384);
        slow.resources.cpu_frequency = 19200;
        slow.available.cpu_frequency = 19200;
        slow.resources.cpu_min_freq = 2400;
        slow.available.cpu_min_freq = 2400;

        let mut task = task_with(ResourceSet::zero(), BTreeMap::new());
        task.resources.cpu_frequency = 9600;
        task.resources.memory = 1024;

        assert!(score(&fast, &task) > score(&slow, &task));
    }
}
