// SPDX-License-Identifier: MIT

//! Filesystem side-channel: under `data_path`, each job gets a directory
//! holding the submitted spec and one log file per task.

use lightsched_wire::JobSpec;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("io error for job {job_id}: {source}")]
    Io { job_id: String, #[source] source: std::io::Error },
    #[error("failed to serialize job content for {0}")]
    Serialize(String),
}

#[derive(Debug, Clone)]
pub struct JobWorkspace {
    data_path: PathBuf,
}

impl JobWorkspace {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self { data_path: data_path.into() }
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.data_path.join(job_id)
    }

    /// Writes `<data_path>/<job_id>/job_content.json` with the submitted spec.
    pub fn write_job_content(&self, job_id: &str, spec: &JobSpec) -> Result<(), WorkspaceError> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(&dir)
            .map_err(|source| WorkspaceError::Io { job_id: job_id.to_string(), source })?;
        let json = serde_json::to_vec_pretty(spec)
            .map_err(|_| WorkspaceError::Serialize(job_id.to_string()))?;
        fs::write(dir.join("job_content.json"), json)
            .map_err(|source| WorkspaceError::Io { job_id: job_id.to_string(), source })?;
        Ok(())
    }

    /// Appends `text` to `<data_path>/<job_id>/<group_idx>.<task_idx>.log`.
    pub fn append_task_log(
        &self,
        job_id: &str,
        group_idx: usize,
        task_idx: usize,
        text: &str,
    ) -> Result<(), WorkspaceError> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(&dir)
            .map_err(|source| WorkspaceError::Io { job_id: job_id.to_string(), source })?;
        let path = dir.join(format!("{group_idx}.{task_idx}.log"));
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| WorkspaceError::Io { job_id: job_id.to_string(), source })?;
        file.write_all(text.as_bytes())
            .map_err(|source| WorkspaceError::Io { job_id: job_id.to_string(), source })?;
        Ok(())
    }

    pub fn read_task_log(&self, job_id: &str, group_idx: usize, task_idx: usize) -> Option<String> {
        let path = self.job_dir(job_id).join(format!("{group_idx}.{task_idx}.log"));
        fs::read_to_string(path).ok()
    }

    /// Removes the job's entire directory, ignoring a missing directory.
    pub fn remove_job_dir(&self, job_id: &str) -> Result<(), WorkspaceError> {
        let dir = self.job_dir(job_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Io { job_id: job_id.to_string(), source }),
        }
    }
}

pub fn ensure_data_path(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightsched_wire::JobSpec;
    use tempfile::tempdir;

    #[test]
    fn write_job_content_creates_json_file() {
        let dir = tempdir().unwrap();
        let workspace = JobWorkspace::new(dir.path());
        let spec = JobSpec { name: "demo".into(), groups: Vec::new(), ..Default::default() };
        workspace.write_job_content("job-1", &spec).unwrap();
        let content = fs::read_to_string(dir.path().join("job-1/job_content.json")).unwrap();
        assert!(content.contains("\"demo\""));
    }

    #[test]
    fn append_task_log_accumulates_across_calls() {
        let dir = tempdir().unwrap();
        let workspace = JobWorkspace::new(dir.path());
        workspace.append_task_log("job-1", 0, 0, "line one\n").unwrap();
        workspace.append_task_log("job-1", 0, 0, "line two\n").unwrap();
        let log = workspace.read_task_log("job-1", 0, 0).unwrap();
        assert_eq!(log, "line one\nline two\n");
    }

    #[test]
    fn remove_job_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let workspace = JobWorkspace::new(dir.path());
        workspace.append_task_log("job-1", 0, 0, "x").unwrap();
        workspace.remove_job_dir("job-1").unwrap();
        workspace.remove_job_dir("job-1").unwrap();
        assert!(workspace.read_task_log("job-1", 0, 0).is_none());
    }
}
