//! Job orchestration facade.
//!
//! [`Orchestrator::submit`] drives one job through its full lifecycle:
//! allocate workspace, persist input, run the analyzer, validate output,
//! release the workspace. Release happens on every path out of `Running`,
//! including cancellation of the calling future.

use std::path::Path;
use std::time::Instant;

use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use vsight_models::{AnalysisResult, Job, UploadedFile};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::reader::read_result;
use crate::runner::{AnalyzerRunner, RunOutcome};
use crate::workspace::WorkspaceManager;

/// Cap on analyzer stderr reproduced in log records.
const STDERR_LOG_EXCERPT: usize = 512;

/// Coordinates workspaces, the analyzer runner, and result validation.
///
/// Holds no per-job shared mutable state; the only state shared across jobs
/// is the process-slot semaphore.
pub struct Orchestrator {
    config: EngineConfig,
    workspaces: WorkspaceManager,
    runner: AnalyzerRunner,
    job_slots: Semaphore,
}

impl Orchestrator {
    /// Create an orchestrator and initialize its work directory.
    pub async fn new(config: EngineConfig) -> EngineResult<Self> {
        let workspaces = WorkspaceManager::new(config.work_dir.clone());
        workspaces.init().await?;
        let runner = AnalyzerRunner::new(&config);
        let job_slots = Semaphore::new(config.max_concurrent_jobs);

        Ok(Self {
            config,
            workspaces,
            runner,
            job_slots,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The work root, exposed for readiness probes.
    pub fn work_dir(&self) -> &Path {
        self.workspaces.work_dir()
    }

    /// Run one analysis job to a terminal state and return its result.
    ///
    /// Suspends the caller until the job finishes. Jobs beyond the
    /// process-slot limit wait on the semaphore without consuming a slot.
    pub async fn submit(&self, upload: UploadedFile) -> EngineResult<AnalysisResult> {
        let _slot = self
            .job_slots
            .acquire()
            .await
            .map_err(|_| EngineError::internal("job slots closed"))?;

        let job = Job::new(upload.file_name.clone());
        info!(
            job_id = %job.id,
            source = job.source_name.as_deref().unwrap_or("<unnamed>"),
            bytes = upload.len(),
            "job accepted"
        );
        metrics::record_job_started();
        let started = Instant::now();

        let result = self.execute(job, upload).await;

        let outcome = match &result {
            Ok(_) => "succeeded",
            Err(e) => e.kind(),
        };
        metrics::record_job_completed(outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn execute(&self, job: Job, upload: UploadedFile) -> EngineResult<AnalysisResult> {
        let workspace = self
            .workspaces
            .allocate(&job.id, &upload.extension())
            .await?;

        // Armed before the job can reach Running; fires on every exit path,
        // including drop of this future on client disconnect.
        let root = workspace.root.clone();
        let _cleanup = scopeguard::guard((), move |_| WorkspaceManager::release_blocking(&root));

        // Input bytes must be fully persisted before the Running transition
        fs::write(&workspace.input_path, &upload.bytes).await?;

        let job = job
            .with_paths(workspace.input_path.clone(), workspace.output_path.clone())
            .start();

        let outcome = self
            .runner
            .run(&workspace, self.config.execution_target)
            .await?;

        match outcome {
            RunOutcome::Exited { code: 0, .. } => {
                match read_result(&workspace.output_path).await {
                    Ok(result) => {
                        let job = job.succeed();
                        info!(
                            job_id = %job.id,
                            duration_ms = job.duration().map(|d| d.num_milliseconds()).unwrap_or(0),
                            "job succeeded"
                        );
                        Ok(result)
                    }
                    Err(e) => {
                        let job = job.fail(e.to_string());
                        warn!(job_id = %job.id, error = %e, "analyzer exited 0 with invalid output");
                        Err(e)
                    }
                }
            }
            RunOutcome::Exited { code, stderr } => {
                let job = job.fail(format!("analyzer exited with code {code}"));
                error!(
                    job_id = %job.id,
                    exit_code = code,
                    stderr = %excerpt(&stderr),
                    "analyzer failed"
                );
                Err(EngineError::analyzer_failed(Some(code), stderr))
            }
            RunOutcome::TimedOut => {
                let job = job.time_out();
                warn!(
                    job_id = %job.id,
                    timeout_secs = self.config.job_timeout.as_secs(),
                    "analyzer timed out"
                );
                Err(EngineError::AnalyzerTimedOut(self.config.job_timeout.as_secs()))
            }
        }
    }
}

/// Truncate stderr for log records, respecting char boundaries.
fn excerpt(s: &str) -> &str {
    if s.len() <= STDERR_LOG_EXCERPT {
        return s;
    }
    let mut end = STDERR_LOG_EXCERPT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
