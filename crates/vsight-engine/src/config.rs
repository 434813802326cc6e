//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use vsight_models::ExecutionTarget;

/// Orchestration engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Analyzer executable: a bare name resolved on PATH, or an explicit path
    pub analyzer_bin: String,
    /// Root directory for per-job workspaces
    pub work_dir: PathBuf,
    /// Wall-clock budget per job
    pub job_timeout: Duration,
    /// Maximum concurrently running analyzer processes
    pub max_concurrent_jobs: usize,
    /// Compute device passed to the analyzer
    pub execution_target: ExecutionTarget,
    /// Cap on captured analyzer stderr, in bytes
    pub stderr_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analyzer_bin: "analyze-video".to_string(),
            work_dir: PathBuf::from("/tmp/vidsight"),
            job_timeout: Duration::from_secs(120),
            max_concurrent_jobs: 2,
            execution_target: ExecutionTarget::Cpu,
            stderr_limit: 16 * 1024,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            analyzer_bin: std::env::var("VIDSIGHT_ANALYZER_BIN")
                .unwrap_or_else(|_| "analyze-video".to_string()),
            work_dir: std::env::var("VIDSIGHT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vidsight")),
            job_timeout: Duration::from_secs(
                std::env::var("VIDSIGHT_JOB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            max_concurrent_jobs: std::env::var("VIDSIGHT_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(2),
            execution_target: std::env::var("VIDSIGHT_EXECUTION_TARGET")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            stderr_limit: std::env::var("VIDSIGHT_STDERR_LIMIT_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16 * 1024),
        }
    }
}
