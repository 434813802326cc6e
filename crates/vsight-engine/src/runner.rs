//! Analyzer process runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use vsight_models::ExecutionTarget;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::workspace::Workspace;

/// How an analyzer process terminated.
///
/// The runner classifies process lifecycle only; it never interprets the
/// analyzer's semantics beyond exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Process exited on its own. Code 0 is candidate success only; the
    /// output artifact still has to validate.
    Exited { code: i32, stderr: String },
    /// Wall-clock budget expired; the process was killed.
    TimedOut,
}

impl RunOutcome {
    pub fn is_candidate_success(&self) -> bool {
        matches!(self, RunOutcome::Exited { code: 0, .. })
    }
}

/// Runs the external analyzer with timeout and bounded stderr capture.
#[derive(Debug, Clone)]
pub struct AnalyzerRunner {
    analyzer_bin: String,
    timeout: Duration,
    stderr_limit: usize,
}

impl AnalyzerRunner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            analyzer_bin: config.analyzer_bin.clone(),
            timeout: config.job_timeout,
            stderr_limit: config.stderr_limit,
        }
    }

    /// Run the analyzer against a workspace.
    ///
    /// The analyzer is invoked with three positional arguments — input path,
    /// output path, execution target — as an argument vector. Nothing is ever
    /// interpolated into a shell string. Exactly one child is spawned per
    /// call, and no child survives this function's return: on timeout the
    /// process is killed and reaped, and `kill_on_drop` covers cancellation
    /// of the calling future.
    pub async fn run(
        &self,
        workspace: &Workspace,
        target: ExecutionTarget,
    ) -> EngineResult<RunOutcome> {
        let program = self.resolve_program()?;

        debug!(
            analyzer = %program.display(),
            input = %workspace.input_path.display(),
            target = %target,
            "launching analyzer"
        );

        let mut command = Command::new(&program);
        command
            .arg(&workspace.input_path)
            .arg(&workspace.output_path)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // The child leads its own process group so the whole analyzer tree
        // can be signaled at once.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn()?;
        let pgid = child.id().map(|id| id as i32);

        // Fires on every exit from this function, including drop of the
        // calling future; signaling an already-dead group is a no-op.
        let _reaper = scopeguard::guard(pgid, kill_process_group);

        let stderr = child.stderr.take().expect("stderr not captured");
        let stderr_limit = self.stderr_limit;
        let stderr_task = tokio::spawn(read_capped(stderr, stderr_limit));

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                let stderr = stderr_task.await.unwrap_or_default();
                // A signal-terminated process has no code; report -1
                let code = status.code().unwrap_or(-1);
                Ok(RunOutcome::Exited { code, stderr })
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "analyzer timed out, killing process tree"
                );
                kill_process_group(pgid);
                // Reap so no child survives this call
                if let Err(e) = child.wait().await {
                    warn!(error = %e, "failed to reap timed-out analyzer");
                }
                stderr_task.abort();
                Ok(RunOutcome::TimedOut)
            }
        }
    }

    /// Resolve the analyzer program: bare names are looked up on PATH,
    /// explicit paths must exist.
    fn resolve_program(&self) -> EngineResult<PathBuf> {
        let bin = Path::new(&self.analyzer_bin);
        if bin.components().count() > 1 {
            if bin.exists() {
                Ok(bin.to_path_buf())
            } else {
                Err(EngineError::AnalyzerNotFound(self.analyzer_bin.clone()))
            }
        } else {
            which::which(&self.analyzer_bin)
                .map_err(|_| EngineError::AnalyzerNotFound(self.analyzer_bin.clone()))
        }
    }
}

/// SIGKILL an analyzer's process group.
#[cfg(unix)]
fn kill_process_group(pgid: Option<i32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pgid) = pgid {
        // ESRCH means the group is already gone
        let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: Option<i32>) {}

/// Drain a stream to EOF, keeping at most `limit` bytes.
///
/// The stream is always read to completion so a chatty child is never
/// blocked on a full pipe.
async fn read_capped<R>(mut stream: R, limit: usize) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut captured = Vec::with_capacity(limit.min(4096));
    let mut buf = [0u8; 4096];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let remaining = limit.saturating_sub(captured.len());
                captured.extend_from_slice(&buf[..n.min(remaining)]);
            }
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&captured).into_owned()
}
