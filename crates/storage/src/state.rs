// SPDX-License-Identifier: MIT

//! The durable, serializable source of truth for queues, jobs, and tasks.
//!
//! In-memory structures are guarded by a single reader/writer lock; every
//! mutating operation takes the write lock. Reads return deep-enough
//! copies that a caller cannot observe subsequent mutation of fields it
//! already inspected.

use crate::error::persistence_err;
use crate::kv::{KvStore, Namespace};
use lightsched_core::{
    Clock, Job, JobId, JobQueue, JobState, ResourceSet, StoreError, SystemClock, Task, TaskGroup,
    TaskGroupId, TaskId, TaskState,
};
use lightsched_wire::{JobSpec, SortKey, TaskGroupSpec, TaskSpec};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

struct StateInner {
    queues: BTreeMap<String, JobQueue>,
    jobs: BTreeMap<JobId, Job>,
}

pub struct StateStore<C: Clock = SystemClock> {
    inner: RwLock<StateInner>,
    kv: KvStore,
    clock: C,
}

#[derive(Serialize, Deserialize)]
struct GroupRecord {
    id: TaskGroupId,
    name: String,
    command: String,
    workdir: String,
    envs: Vec<String>,
    labels: BTreeMap<String, String>,
    resources: ResourceSet,
    dependents: Vec<String>,
    task_count: usize,
}

#[derive(Serialize, Deserialize)]
struct JobRecord {
    id: JobId,
    name: String,
    queue: String,
    priority: i32,
    labels: BTreeMap<String, String>,
    taints: BTreeMap<String, String>,
    max_errors: i32,
    state: JobState,
    progress: i32,
    submit_time: chrono::DateTime<chrono::Utc>,
    start_time: Option<chrono::DateTime<chrono::Utc>>,
    finish_time: Option<chrono::DateTime<chrono::Utc>>,
    groups: Vec<GroupRecord>,
}

impl JobRecord {
    fn from_job(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            queue: job.queue.clone(),
            priority: job.priority,
            labels: job.labels.clone(),
            taints: job.taints.clone(),
            max_errors: job.max_errors,
            state: job.state,
            progress: job.progress,
            submit_time: job.submit_time,
            start_time: job.start_time,
            finish_time: job.finish_time,
            groups: job
                .groups
                .iter()
                .map(|g| GroupRecord {
                    id: g.id.clone(),
                    name: g.name.clone(),
                    command: g.command.clone(),
                    workdir: g.workdir.clone(),
                    envs: g.envs.clone(),
                    labels: g.labels.clone(),
                    resources: g.resources,
                    dependents: g.dependents.clone(),
                    task_count: g.tasks.len(),
                })
                .collect(),
        }
    }

    fn into_job_skeleton(self) -> Job {
        let job_id = self.id.clone();
        Job {
            id: self.id,
            name: self.name,
            queue: self.queue,
            priority: self.priority,
            labels: self.labels,
            taints: self.taints,
            max_errors: self.max_errors,
            state: self.state,
            progress: self.progress,
            submit_time: self.submit_time,
            start_time: self.start_time,
            finish_time: self.finish_time,
            groups: self
                .groups
                .into_iter()
                .enumerate()
                .map(|(g_idx, g)| TaskGroup {
                    id: g.id,
                    name: g.name,
                    command: g.command,
                    workdir: g.workdir,
                    envs: g.envs,
                    labels: g.labels,
                    resources: g.resources,
                    dependents: g.dependents,
                    tasks: (0..g.task_count)
                        .map(|t_idx| placeholder_task(&job_id, g_idx, t_idx))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Fills a group's task slots before the task namespace scan overwrites
/// each one at its real index; if a task row is ever missing, the
/// placeholder's presence is itself the bug signal (it stays `Queued`
/// with an empty command forever, which existing tests would catch).
fn placeholder_task(job_id: &JobId, g_idx: usize, t_idx: usize) -> Task {
    Task {
        id: TaskId::new(job_id, g_idx, t_idx),
        name: String::new(),
        command: String::new(),
        args: String::new(),
        workdir: String::new(),
        envs: Vec::new(),
        labels: BTreeMap::new(),
        taints: BTreeMap::new(),
        resources: ResourceSet::zero(),
        state: TaskState::Queued,
        node_name: None,
        progress: 0,
        exit_code: None,
        error: String::new(),
        queue_time: chrono::Utc::now(),
        start_time: None,
        finish_time: None,
    }
}

impl<C: Clock> StateStore<C> {
    pub fn new(kv: KvStore, clock: C) -> Self {
        Self { inner: RwLock::new(StateInner { queues: BTreeMap::new(), jobs: BTreeMap::new() }), kv, clock }
    }

    /// Loads queues, then jobs, then tasks (rehydrating each task into its
    /// job's group by index). Creates the `default` queue if the store is
    /// otherwise empty.
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        for (_, value) in self.kv.scan_all(Namespace::Queue).map_err(persistence_err)? {
            let queue: JobQueue = serde_json::from_slice(&value).map_err(persistence_err)?;
            inner.queues.insert(queue.name.clone(), queue);
        }
        if inner.queues.is_empty() {
            let default_queue = JobQueue::default_queue();
            self.persist_queue(&default_queue)?;
            inner.queues.insert(default_queue.name.clone(), default_queue);
        }

        for (_, value) in self.kv.scan_all(Namespace::Job).map_err(persistence_err)? {
            let record: JobRecord = serde_json::from_slice(&value).map_err(persistence_err)?;
            let job = record.into_job_skeleton();
            inner.jobs.insert(job.id.clone(), job);
        }

        for (key, value) in self.kv.scan_all(Namespace::Task).map_err(persistence_err)? {
            let task: Task = serde_json::from_slice(&value).map_err(persistence_err)?;
            let (job_id, group_idx, task_idx) =
                task.id.parse().map_err(|_| StoreError::Persistence(format!("malformed task key {key}")))?;
            let job = inner
                .jobs
                .get_mut(&job_id)
                .ok_or_else(|| StoreError::Persistence(format!("task {key} has no owning job")))?;
            let group = job
                .groups
                .get_mut(group_idx)
                .ok_or_else(|| StoreError::Persistence(format!("task {key} has no owning group")))?;
            if group.tasks.len() <= task_idx {
                return Err(StoreError::Persistence(format!("task {key} index out of range")));
            }
            group.tasks[task_idx] = task;
        }

        Ok(())
    }

    pub fn add_job(&self, spec: &JobSpec) -> Result<Job, StoreError> {
        if spec.name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        for group in &spec.groups {
            if group.tasks.is_empty() {
                return Err(StoreError::EmptyTaskGroup(group.name.clone()));
            }
        }

        let mut inner = self.inner.write();

        let queue_name = spec.queue.clone().unwrap_or_else(|| lightsched_core::queue::DEFAULT_QUEUE_NAME.to_string());
        if !inner.queues.contains_key(&queue_name) {
            return Err(StoreError::UnknownQueue(queue_name));
        }

        let job_id = match &spec.id {
            Some(id) if !id.is_empty() => JobId::from(id.as_str()),
            _ => JobId::new(),
        };
        if inner.jobs.contains_key(&job_id) {
            return Err(StoreError::DuplicateId(job_id.to_string()));
        }

        let now = self.clock.now();
        let groups = build_groups(&job_id, &spec.groups)?;
        let initial_state = if spec.schedulable { JobState::Queued } else { JobState::Halted };

        let job = Job {
            id: job_id,
            name: spec.name.clone(),
            queue: queue_name,
            priority: spec.priority,
            labels: spec.labels.clone(),
            taints: spec.taints.clone(),
            max_errors: spec.max_errors,
            state: initial_state,
            progress: 0,
            submit_time: now,
            start_time: None,
            finish_time: None,
            groups,
        };

        self.persist_job_record(&job)?;
        for group in &job.groups {
            for task in &group.tasks {
                self.persist_task(task)?;
            }
        }

        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    /// Refuses deletion of jobs in `Executing` or `Terminating`.
    pub fn delete_job(&self, id: &JobId) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let job = inner.jobs.get(id).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
        if matches!(job.state, JobState::Executing | JobState::Terminating) {
            return Err(StoreError::JobNotDeletable { id: id.to_string(), state: job.state });
        }
        inner.jobs.remove(id);
        self.kv.delete(Namespace::Job, id.as_str()).map_err(persistence_err)?;
        self.kv.delete_prefix(Namespace::Task, &format!("{}.", id.as_str())).map_err(persistence_err)?;
        Ok(())
    }

    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Every task currently holding resources on `node_name` (scheduled,
    /// dispatching, or executing) — used to requeue work after a node
    /// times out.
    pub fn tasks_on_node(&self, node_name: &str) -> Vec<Task> {
        let inner = self.inner.read();
        inner
            .jobs
            .values()
            .flat_map(|job| job.groups.iter())
            .flat_map(|group| group.tasks.iter())
            .filter(|t| t.state.holds_resources() && t.node_name.as_deref() == Some(node_name))
            .cloned()
            .collect()
    }

    /// Enabled queues, sorted by priority descending.
    pub fn schedulable_queues(&self) -> Vec<JobQueue> {
        let mut queues: Vec<JobQueue> =
            self.inner.read().queues.values().filter(|q| q.enabled).cloned().collect();
        queues.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));
        queues
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        self.inner.read().jobs.get(id).cloned()
    }

    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        let (job_id, group_idx, task_idx) = id.parse().ok()?;
        let inner = self.inner.read();
        let job = inner.jobs.get(&job_id)?;
        let group = job.groups.get(group_idx)?;
        group.tasks.get(task_idx).cloned()
    }

    /// Returns a sorted, paginated snapshot of jobs.
    pub fn query_jobs(&self, filter_state: Option<JobState>, sort: SortKey, offset: i64, limit: i64) -> Vec<Job> {
        let inner = self.inner.read();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| filter_state.map(|s| j.state == s).unwrap_or(true))
            .cloned()
            .collect();
        drop(inner);

        match sort {
            SortKey::Default => jobs.sort_by(|a, b| {
                b.is_schedulable()
                    .cmp(&a.is_schedulable())
                    .then(b.priority.cmp(&a.priority))
                    .then(a.submit_time.cmp(&b.submit_time))
                    .then(a.name.cmp(&b.name))
            }),
            SortKey::State => jobs.sort_by(|a, b| {
                state_rank(a.state)
                    .cmp(&state_rank(b.state))
                    .then(b.priority.cmp(&a.priority))
                    .then(a.submit_time.cmp(&b.submit_time))
            }),
            SortKey::Submit => jobs.sort_by(|a, b| b.submit_time.cmp(&a.submit_time)),
        }

        let offset = offset.max(0) as usize;
        if offset >= jobs.len() {
            return Vec::new();
        }
        let jobs = &jobs[offset..];
        if limit < 0 {
            jobs.to_vec()
        } else {
            jobs.iter().take(limit as usize).cloned().collect()
        }
    }

    /// Locates the task via its parsed ID, applies the update, concatenates
    /// `err` into the accumulated error text, and triggers a job state
    /// refresh unless this is purely a progress update within `Executing`.
    pub fn update_task_status(
        &self,
        id: &TaskId,
        state: TaskState,
        progress: i32,
        exit: Option<i32>,
        err: &str,
    ) -> Result<(), StoreError> {
        let (job_id, group_idx, task_idx) =
            id.parse().map_err(|_| StoreError::UnknownId(id.to_string()))?;
        let now = self.clock.now();
        let mut inner = self.inner.write();

        let (task_snapshot, state_changed, old_state) = {
            let job = inner.jobs.get_mut(&job_id).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
            let group = job.groups.get_mut(group_idx).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
            let task = group.tasks.get_mut(task_idx).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;

            let old_state = task.state;
            if old_state == state && state.is_terminal() {
                // An out-of-order retransmit of a report already applied to this
                // (already-terminal) task. Ignore it entirely rather than
                // re-appending its error text or touching progress/exit_code.
                return Ok(());
            }

            let state_changed = old_state != state;
            task.progress = progress;
            if let Some(code) = exit {
                task.exit_code = Some(code);
            }
            if !err.is_empty() {
                task.append_error(err);
            }
            if state_changed {
                task.state = state;
                if state == TaskState::Executing && task.start_time.is_none() {
                    task.start_time = Some(now);
                }
                if state.is_terminal() {
                    task.finish_time = Some(now);
                }
            }
            (task.clone(), state_changed, old_state)
        };

        if state_changed {
            self.persist_task(&task_snapshot)?;
        }

        let purely_progress_within_executing = !state_changed && old_state == TaskState::Executing;
        if !purely_progress_within_executing {
            self.refresh_job_state_locked(&job_id, &mut inner, now)?;
        }
        Ok(())
    }

    /// Atomic batch write of already-mutated tasks (e.g. after a scheduling
    /// cycle, or the timeout sweep's mass requeue).
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        for task in tasks {
            let (job_id, group_idx, task_idx) =
                task.id.parse().map_err(|_| StoreError::UnknownId(task.id.to_string()))?;
            let job = inner.jobs.get_mut(&job_id).ok_or_else(|| StoreError::UnknownId(task.id.to_string()))?;
            let group = job.groups.get_mut(group_idx).ok_or_else(|| StoreError::UnknownId(task.id.to_string()))?;
            let slot = group.tasks.get_mut(task_idx).ok_or_else(|| StoreError::UnknownId(task.id.to_string()))?;
            *slot = task.clone();
        }
        for task in tasks {
            self.persist_task(task)?;
        }
        Ok(())
    }

    pub fn set_job_state(&self, id: &JobId, state: JobState) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let job = inner.jobs.get_mut(id).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
        job.state = state;
        let snapshot = job.clone();
        self.persist_job_record(&snapshot)
    }

    pub fn refresh_job_state(&self, id: &JobId) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        self.refresh_job_state_locked(id, &mut inner, now)
    }

    fn refresh_job_state_locked(
        &self,
        id: &JobId,
        inner: &mut StateInner,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        let job = inner.jobs.get_mut(id).ok_or_else(|| StoreError::UnknownId(id.to_string()))?;
        job.refresh_state(now);
        let snapshot = job.clone();
        self.persist_job_record(&snapshot)
    }

    fn persist_queue(&self, queue: &JobQueue) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(queue).map_err(persistence_err)?;
        self.kv.put(Namespace::Queue, &queue.name, &bytes).map_err(persistence_err)
    }

    fn persist_job_record(&self, job: &Job) -> Result<(), StoreError> {
        let record = JobRecord::from_job(job);
        let bytes = serde_json::to_vec(&record).map_err(persistence_err)?;
        self.kv.put(Namespace::Job, job.id.as_str(), &bytes).map_err(persistence_err)
    }

    fn persist_task(&self, task: &Task) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(task).map_err(persistence_err)?;
        self.kv.put(Namespace::Task, task.id.as_str(), &bytes).map_err(persistence_err)
    }
}

fn state_rank(state: JobState) -> u8 {
    match state {
        JobState::Queued => 0,
        JobState::Executing => 1,
        JobState::Halted => 2,
        JobState::Terminating => 3,
        JobState::Completed => 4,
        JobState::Failed => 5,
        JobState::Terminated => 6,
    }
}

fn build_groups(job_id: &JobId, specs: &[TaskGroupSpec]) -> Result<Vec<TaskGroup>, StoreError> {
    specs
        .iter()
        .enumerate()
        .map(|(g_idx, group_spec)| build_group(job_id, g_idx, group_spec))
        .collect()
}

fn build_group(job_id: &JobId, g_idx: usize, spec: &TaskGroupSpec) -> Result<TaskGroup, StoreError> {
    let group_resources = match &spec.resources {
        Some(r) => r.to_resource_set().map_err(|e| StoreError::InvalidResourceSpec(e.to_string()))?,
        None => ResourceSet::default_task_requirement(),
    };
    let tasks = spec
        .tasks
        .iter()
        .enumerate()
        .map(|(t_idx, task_spec)| build_task(job_id, g_idx, t_idx, task_spec, spec, group_resources))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TaskGroup {
        id: TaskGroupId::new(job_id, g_idx),
        name: spec.name.clone(),
        command: spec.command.clone().unwrap_or_default(),
        workdir: spec.workdir.clone().unwrap_or_default(),
        envs: spec.envs.clone(),
        labels: spec.labels.clone(),
        resources: group_resources,
        dependents: spec.dependents.clone(),
        tasks,
    })
}

fn build_task(
    job_id: &JobId,
    g_idx: usize,
    t_idx: usize,
    task_spec: &TaskSpec,
    group_spec: &TaskGroupSpec,
    group_resources: ResourceSet,
) -> Result<Task, StoreError> {
    let resources = match &task_spec.resources {
        Some(r) => r.to_resource_set().map_err(|e| StoreError::InvalidResourceSpec(e.to_string()))?,
        None => group_resources,
    };
    let envs = lightsched_core::task::merge_string_lists(&task_spec.envs, &group_spec.envs);
    let labels = lightsched_core::task::merge_label_maps(&task_spec.labels, &group_spec.labels);
    Ok(Task {
        id: TaskId::new(job_id, g_idx, t_idx),
        name: task_spec.name.clone(),
        command: task_spec.command.clone().unwrap_or_else(|| group_spec.command.clone().unwrap_or_default()),
        args: task_spec.args.clone().unwrap_or_default(),
        workdir: task_spec.workdir.clone().unwrap_or_else(|| group_spec.workdir.clone().unwrap_or_default()),
        envs,
        labels,
        taints: BTreeMap::new(),
        resources,
        state: TaskState::Queued,
        node_name: None,
        progress: 0,
        exit_code: None,
        error: String::new(),
        queue_time: chrono::Utc::now(),
        start_time: None,
        finish_time: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightsched_core::FakeClock;
    use lightsched_wire::TaskSpec as WireTaskSpec;

    fn store() -> StateStore<FakeClock> {
        let store = StateStore::new(KvStore::open_in_memory().unwrap(), FakeClock::new());
        store.bootstrap().unwrap();
        store
    }

    fn spec_with_tasks(name: &str, task_count: usize) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            schedulable: true,
            groups: vec![TaskGroupSpec {
                name: "g0".into(),
                command: Some("true".into()),
                tasks: (0..task_count)
                    .map(|i| WireTaskSpec { name: format!("t{i}"), ..Default::default() })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn add_job_rejects_empty_name() {
        let store = store();
        let spec = JobSpec { name: String::new(), ..Default::default() };
        assert_eq!(store.add_job(&spec).unwrap_err(), StoreError::EmptyName);
    }

    #[test]
    fn add_job_rejects_empty_task_group() {
        let store = store();
        let spec = JobSpec {
            name: "demo".into(),
            groups: vec![TaskGroupSpec { name: "g0".into(), tasks: Vec::new(), ..Default::default() }],
            ..Default::default()
        };
        assert!(matches!(store.add_job(&spec), Err(StoreError::EmptyTaskGroup(_))));
    }

    #[test]
    fn add_job_rejects_unknown_queue() {
        let store = store();
        let spec = JobSpec { name: "demo".into(), queue: Some("nope".into()), ..Default::default() };
        assert!(matches!(store.add_job(&spec), Err(StoreError::UnknownQueue(_))));
    }

    #[test]
    fn add_job_persists_and_survives_bootstrap() {
        let kv = KvStore::open_in_memory().unwrap();
        let store = StateStore::new(kv, FakeClock::new());
        store.bootstrap().unwrap();
        let job = store.add_job(&spec_with_tasks("demo", 2)).unwrap();
        assert_eq!(job.total_tasks(), 2);
        assert_eq!(store.query_jobs(None, SortKey::Default, 0, -1).len(), 1);
    }

    #[test]
    fn delete_job_refuses_executing() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 1)).unwrap();
        store.set_job_state(&job.id, JobState::Executing).unwrap();
        assert!(matches!(store.delete_job(&job.id), Err(StoreError::JobNotDeletable { .. })));
    }

    #[test]
    fn delete_job_removes_tasks_by_prefix() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 2)).unwrap();
        store.delete_job(&job.id).unwrap();
        assert!(store.get_job(&job.id).is_none());
    }

    #[test]
    fn update_task_status_sets_start_time_once() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 1)).unwrap();
        let task_id = job.groups[0].tasks[0].id.clone();
        store.update_task_status(&task_id, TaskState::Executing, 0, None, "").unwrap();
        let t1 = store.get_task(&task_id).unwrap();
        assert!(t1.start_time.is_some());
        store.update_task_status(&task_id, TaskState::Executing, 50, None, "").unwrap();
        let t2 = store.get_task(&task_id).unwrap();
        assert_eq!(t1.start_time, t2.start_time);
        assert_eq!(t2.progress, 50);
    }

    #[test]
    fn update_task_status_concatenates_errors_across_distinct_states() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 1)).unwrap();
        let task_id = job.groups[0].tasks[0].id.clone();
        store.update_task_status(&task_id, TaskState::Executing, 0, None, "warning one").unwrap();
        store
            .update_task_status(&task_id, TaskState::Failed, 0, Some(1), "fatal")
            .unwrap();
        let task = store.get_task(&task_id).unwrap();
        assert_eq!(task.error, "warning one;fatal");
    }

    #[test]
    fn a_retransmitted_terminal_report_is_ignored() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 1)).unwrap();
        let task_id = job.groups[0].tasks[0].id.clone();
        store.update_task_status(&task_id, TaskState::Failed, 0, Some(1), "first").unwrap();
        store
            .update_task_status(&task_id, TaskState::Failed, 0, Some(1), "second")
            .unwrap();
        let task = store.get_task(&task_id).unwrap();
        assert_eq!(task.error, "first", "a same-state terminal retransmit must not re-apply");
    }

    #[test]
    fn job_completes_when_all_tasks_completed() {
        let store = store();
        let job = store.add_job(&spec_with_tasks("demo", 1)).unwrap();
        let task_id = job.groups[0].tasks[0].id.clone();
        store.update_task_status(&task_id, TaskState::Completed, 100, Some(0), "").unwrap();
        let job = store.get_job(&job.id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn query_jobs_default_sort_prefers_schedulable_then_priority() {
        let store = store();
        let mut high = spec_with_tasks("high", 1);
        high.priority = 10;
        let mut low = spec_with_tasks("low", 1);
        low.priority = 1;
        store.add_job(&low).unwrap();
        store.add_job(&high).unwrap();
        let jobs = store.query_jobs(None, SortKey::Default, 0, -1);
        assert_eq!(jobs[0].name, "high");
    }

    #[test]
    fn query_jobs_respects_offset_and_limit() {
        let store = store();
        for i in 0..5 {
            store.add_job(&spec_with_tasks(&format!("job{i}"), 1)).unwrap();
        }
        let page = store.query_jobs(None, SortKey::Submit, 1, 2);
        assert_eq!(page.len(), 2);
    }
}
