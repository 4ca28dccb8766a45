// SPDX-License-Identifier: MIT

//! Task process lifecycle: resolving the command, spawning it, streaming
//! its combined output, and reporting status back through a bounded update
//! channel so all mutable worker state stays single-threaded in the main
//! loop.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub enum TaskUpdate {
    Executing { task_id: String },
    Progress { task_id: String, progress: i32 },
    Error { task_id: String, message: String },
    Completed { task_id: String, exit_code: i32 },
    Failed { task_id: String, exit_code: i32, message: String },
    Aborted { task_id: String, message: String },
}

impl TaskUpdate {
    pub fn task_id(&self) -> &str {
        match self {
            TaskUpdate::Executing { task_id }
            | TaskUpdate::Progress { task_id, .. }
            | TaskUpdate::Error { task_id, .. }
            | TaskUpdate::Completed { task_id, .. }
            | TaskUpdate::Failed { task_id, .. }
            | TaskUpdate::Aborted { task_id, .. } => task_id,
        }
    }
}

/// A line matches the progress marker iff it starts with `[PROGRESS]`
/// followed by one or more spaces, then an integer, then `%`, optionally
/// followed by more whitespace and trailing free text. No whitespace is
/// tolerated between the integer and `%`.
pub fn parse_progress_line(line: &str) -> Option<(i32, &str)> {
    let rest = line.strip_prefix("[PROGRESS]")?;
    let digits_start = rest.len() - rest.trim_start_matches(' ').len();
    if digits_start == 0 {
        return None;
    }
    let rest = &rest[digits_start..];
    let digit_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digit_end == 0 {
        return None;
    }
    let number = &rest[..digit_end];
    let rest = &rest[digit_end..];
    let rest = rest.strip_prefix('%')?;
    Some((number.parse().ok()?, rest.trim_start_matches(' ')))
}

/// `[ERROR]` lines use the same one-space-after-tag rule as progress lines.
pub fn parse_error_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("[ERROR]")?;
    let rest = rest.strip_prefix(' ')?;
    Some(rest)
}

/// One executing task: its process handle (for termination) and a flag set
/// once a kill has been requested, so the exit-status handler can remap
/// `Failed` to `Terminated`.
pub struct RunningTask {
    pub job_id: String,
    child: Arc<Mutex<tokio::process::Child>>,
    pub killed: Arc<std::sync::atomic::AtomicBool>,
}

impl RunningTask {
    pub async fn kill(&self) {
        self.killed.store(true, std::sync::atomic::Ordering::SeqCst);
        let mut child = self.child.lock().await;
        let _ = child.kill().await;
    }

    pub fn killed(&self) -> bool {
        self.killed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Resolves `command` to an absolute path: used as-is if already absolute
/// or found on `PATH`-equivalent resolution, otherwise resolved relative
/// to the worker binary's own directory.
pub fn resolve_command(command: &str, binary_dir: &Path) -> Option<PathBuf> {
    let as_path = Path::new(command);
    if as_path.is_absolute() && as_path.exists() {
        return Some(as_path.to_path_buf());
    }
    if let Ok(resolved) = which(command) {
        return Some(resolved);
    }
    let candidate = binary_dir.join(command);
    if candidate.exists() {
        return Some(candidate);
    }
    None
}

fn which(command: &str) -> Result<PathBuf, ()> {
    let path_var = std::env::var_os("PATH").ok_or(())?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(command);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(())
}

/// Spawns `command` and streams its combined stdout/stderr, translating
/// `[PROGRESS]`/`[ERROR]` lines into updates and accumulating every line
/// (minus the worker-internal tags) into the returned log buffer, which the
/// caller uploads once the process exits.
pub async fn spawn_task(
    task_id: String,
    job_id: String,
    command: &str,
    args: &str,
    workdir: &str,
    envs: &[String],
    binary_dir: &Path,
    updates: Sender<TaskUpdate>,
) -> Option<RunningTask> {
    let Some(resolved) = resolve_command(command, binary_dir) else {
        let _ = updates
            .send(TaskUpdate::Aborted { task_id, message: format!("command not found: {command}") })
            .await;
        return None;
    };

    let mut cmd = Command::new(resolved);
    if !args.is_empty() {
        cmd.args(args.split_whitespace());
    }
    if !workdir.is_empty() {
        cmd.current_dir(workdir);
    }
    for entry in envs {
        if let Some((key, value)) = entry.split_once('=') {
            cmd.env(key, value);
        }
    }
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            let _ = updates
                .send(TaskUpdate::Aborted { task_id, message: format!("spawn failed: {err}") })
                .await;
            return None;
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let killed = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let child = Arc::new(Mutex::new(child));

    let _ = updates.send(TaskUpdate::Executing { task_id: task_id.clone() }).await;

    let log = Arc::new(Mutex::new(String::new()));
    if let Some(stdout) = stdout {
        tokio::spawn(stream_output(task_id.clone(), stdout, updates.clone(), log.clone()));
    }
    if let Some(stderr) = stderr {
        tokio::spawn(stream_output(task_id.clone(), stderr, updates.clone(), log.clone()));
    }

    let wait_child = child.clone();
    let wait_killed = killed.clone();
    let wait_task_id = task_id.clone();
    tokio::spawn(async move {
        let status = {
            let mut guard = wait_child.lock().await;
            guard.wait().await
        };
        let update = match status {
            Ok(status) if status.success() => {
                TaskUpdate::Completed { task_id: wait_task_id, exit_code: 0 }
            }
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                if wait_killed.load(std::sync::atomic::Ordering::SeqCst) {
                    TaskUpdate::Failed {
                        task_id: wait_task_id,
                        exit_code: code,
                        message: "killed".to_string(),
                    }
                } else {
                    TaskUpdate::Failed {
                        task_id: wait_task_id,
                        exit_code: code,
                        message: format!("exited with status {status}"),
                    }
                }
            }
            Err(err) => {
                TaskUpdate::Aborted { task_id: wait_task_id, message: format!("wait failed: {err}") }
            }
        };
        let _ = updates.send(update).await;
    });

    Some(RunningTask { job_id, child, killed })
}

async fn stream_output(
    task_id: String,
    reader: impl tokio::io::AsyncRead + Unpin,
    updates: Sender<TaskUpdate>,
    log: Arc<Mutex<String>>,
) {
    let mut lines = BufReader::new(reader).lines();
    let mut last_progress = -1;
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some((progress, text)) = parse_progress_line(&line) {
            if progress > last_progress {
                last_progress = progress;
                let _ = updates
                    .send(TaskUpdate::Progress { task_id: task_id.clone(), progress })
                    .await;
            }
            if !text.is_empty() {
                log.lock().await.push_str(text);
                log.lock().await.push('\n');
            }
            continue;
        }
        if let Some(message) = parse_error_line(&line) {
            let _ = updates
                .send(TaskUpdate::Error { task_id: task_id.clone(), message: message.to_string() })
                .await;
            continue;
        }
        log.lock().await.push_str(&line);
        log.lock().await.push('\n');
    }
}
