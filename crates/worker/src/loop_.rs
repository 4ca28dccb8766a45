// SPDX-License-Identifier: MIT

//! The worker's single-threaded coordinator: a state machine
//! (`Unknown`/`Online`/`Offline`) driven by a heartbeat timer and the
//! task-update channel fed by per-task executor tasks.

use crate::client::{ClientError, ControllerClient};
use crate::executor::{spawn_task, RunningTask, TaskUpdate};
use crate::probe::current_load;
use lightsched_wire::{Heartbeat, OutboxKind, OutboxMessage, RegisterNode, TaskDispatch, TaskReport};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Unknown,
    Online,
    Offline,
}

/// Accumulates `TaskUpdate`s into the pending heartbeat payload, collapsing
/// repeated same-state reports and concatenating error text so a burst of
/// progress lines produces one outgoing report per task, not one per line.
#[derive(Default)]
pub struct PendingReports(BTreeMap<String, TaskReport>);

impl PendingReports {
    fn entry(&mut self, task_id: &str) -> &mut TaskReport {
        self.0.entry(task_id.to_string()).or_insert_with(|| TaskReport {
            id: task_id.to_string(),
            state: "Queued".to_string(),
            progress: 0,
            exit_code: None,
            error: String::new(),
        })
    }

    fn append_error(report: &mut TaskReport, message: &str) {
        if report.error.is_empty() {
            report.error = message.to_string();
        } else {
            report.error.push(';');
            report.error.push_str(message);
        }
    }

    pub fn apply(&mut self, update: TaskUpdate, killed: bool) {
        let task_id = update.task_id().to_string();
        match update {
            TaskUpdate::Executing { .. } => {
                self.entry(&task_id).state = "Executing".to_string();
            }
            TaskUpdate::Progress { progress, .. } => {
                let report = self.entry(&task_id);
                if progress > report.progress {
                    report.progress = progress;
                }
            }
            TaskUpdate::Error { message, .. } => {
                let report = self.entry(&task_id);
                Self::append_error(report, &message);
            }
            TaskUpdate::Completed { exit_code, .. } => {
                let report = self.entry(&task_id);
                report.state = "Completed".to_string();
                report.progress = 100;
                report.exit_code = Some(exit_code);
            }
            TaskUpdate::Failed { exit_code, message, .. } => {
                let report = self.entry(&task_id);
                report.state = if killed { "Terminated".to_string() } else { "Failed".to_string() };
                report.exit_code = Some(exit_code);
                Self::append_error(report, &message);
            }
            TaskUpdate::Aborted { message, .. } => {
                let report = self.entry(&task_id);
                report.state = "Aborted".to_string();
                Self::append_error(report, &message);
            }
        }
    }

    pub fn drain(&mut self) -> Vec<TaskReport> {
        std::mem::take(&mut self.0).into_values().collect()
    }

    /// Restores reports that failed to send. Anything the caller has
    /// reported since the failed attempt (i.e. already re-inserted by
    /// `apply`) takes precedence over the stale restored copy.
    pub fn restore(&mut self, reports: Vec<TaskReport>) {
        for report in reports {
            self.0.entry(report.id.clone()).or_insert(report);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct WorkerLoop {
    pub client: ControllerClient,
    pub descriptor: RegisterNode,
    pub heartbeat_interval: Duration,
    pub binary_dir: PathBuf,
}

impl WorkerLoop {
    pub async fn run(mut self) {
        let mut state = WorkerState::Unknown;
        let mut pending = PendingReports::default();
        let mut running: BTreeMap<String, RunningTask> = BTreeMap::new();
        let (update_tx, mut update_rx) = mpsc::channel(32);
        let mut consecutive_failures = 0u32;

        loop {
            match state {
                WorkerState::Unknown => {
                    match self.client.register(&self.descriptor).await {
                        Ok(()) => {
                            info!(node = %self.descriptor.name, "registered with controller");
                            state = WorkerState::Online;
                            consecutive_failures = 0;
                        }
                        Err(err) => {
                            warn!(error = %err, "registration failed, backing off");
                            tokio::time::sleep(self.heartbeat_interval * 5).await;
                        }
                    }
                }
                WorkerState::Offline => {
                    tokio::time::sleep(self.heartbeat_interval).await;
                }
                WorkerState::Online => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.heartbeat_interval) => {
                            self.drain_updates(&mut update_rx, &mut pending, &running);
                            let reports = pending.drain();
                            let (cpu, memory) = current_load();
                            let body = Heartbeat {
                                name: self.descriptor.name.clone(),
                                cpu,
                                memory,
                                executings: running.len() as i32,
                                payload: reports.clone(),
                            };
                            match self.client.heartbeat(&body).await {
                                Ok(messages) => {
                                    consecutive_failures = 0;
                                    self.dispatch(messages, &mut running, update_tx.clone()).await;
                                }
                                Err(ClientError::NotRegistered) => {
                                    warn!("controller lost this node, re-registering");
                                    pending.restore(reports);
                                    state = WorkerState::Unknown;
                                }
                                Err(err) => {
                                    warn!(error = %err, "heartbeat failed");
                                    pending.restore(reports);
                                    consecutive_failures += 1;
                                    if consecutive_failures >= 4 {
                                        state = WorkerState::Unknown;
                                    } else {
                                        tokio::time::sleep(self.heartbeat_interval * 3).await;
                                    }
                                }
                            }
                        }
                        Some(update) = update_rx.recv() => {
                            self.apply_update(update, &mut pending, &mut running);
                        }
                    }
                }
            }
        }
    }

    fn drain_updates(
        &self,
        update_rx: &mut mpsc::Receiver<TaskUpdate>,
        pending: &mut PendingReports,
        running: &BTreeMap<String, RunningTask>,
    ) {
        while let Ok(update) = update_rx.try_recv() {
            let killed = running.get(update.task_id()).map(|t| t.killed()).unwrap_or(false);
            pending.apply(update, killed);
        }
    }

    fn apply_update(
        &self,
        update: TaskUpdate,
        pending: &mut PendingReports,
        running: &mut BTreeMap<String, RunningTask>,
    ) {
        let task_id = update.task_id().to_string();
        let terminal = matches!(
            update,
            TaskUpdate::Completed { .. } | TaskUpdate::Failed { .. } | TaskUpdate::Aborted { .. }
        );
        let killed = running.get(&task_id).map(|t| t.killed()).unwrap_or(false);
        pending.apply(update, killed);
        if terminal {
            running.remove(&task_id);
        }
    }

    async fn dispatch(
        &self,
        messages: Vec<OutboxMessage>,
        running: &mut BTreeMap<String, RunningTask>,
        updates: mpsc::Sender<TaskUpdate>,
    ) {
        for message in messages {
            match message.kind {
                OutboxKind::ScheduleTask => {
                    let Some(content) = message.content else { continue };
                    let dispatch: TaskDispatch = match serde_json::from_value(content) {
                        Ok(d) => d,
                        Err(err) => {
                            warn!(error = %err, "malformed dispatch payload");
                            continue;
                        }
                    };
                    let job_id = job_id_of(&dispatch.id);
                    if let Some(task) = spawn_task(
                        dispatch.id.clone(),
                        job_id,
                        &dispatch.command,
                        &dispatch.args,
                        &dispatch.workdir,
                        &dispatch.envs,
                        &self.binary_dir,
                        updates.clone(),
                    )
                    .await
                    {
                        running.insert(dispatch.id, task);
                    }
                }
                OutboxKind::TerminateJob => {
                    let job_id = message.object;
                    for task in running.values() {
                        if task.job_id == job_id {
                            task.kill().await;
                        }
                    }
                }
            }
        }
    }
}

fn job_id_of(task_id: &str) -> String {
    let mut parts = task_id.rsplitn(3, '.');
    parts.next();
    parts.next();
    parts.next().unwrap_or(task_id).to_string()
}
