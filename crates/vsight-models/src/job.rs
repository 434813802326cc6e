//! Job definitions for analysis orchestration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// Ids are generated at acceptance time and are never derived from
/// client-supplied filenames. A process never reuses an id, so two jobs
/// cannot collide on workspace or output paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job accepted, workspace not yet populated
    #[default]
    Created,
    /// Analyzer process is running
    Running,
    /// Analyzer exited 0 and the output validated
    Succeeded,
    /// Analyzer exited nonzero or produced invalid output
    Failed,
    /// Analyzer exceeded the wall-clock budget and was killed
    TimedOut,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed_out",
        }
    }

    /// Terminal states are never left.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One analysis request, tracked from acceptance to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Client-supplied display name. Metadata only; never used for paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Path of the persisted input inside the job's workspace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,

    /// Path where the analyzer must write its result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Job state
    #[serde(default)]
    pub state: JobState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When the analyzer was launched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When a terminal state was reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Error message (if failed or timed out)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Job {
    /// Create a new job in the `Created` state.
    pub fn new(source_name: Option<String>) -> Self {
        Self {
            id: JobId::new(),
            source_name,
            input_path: None,
            output_path: None,
            state: JobState::Created,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            error_message: None,
        }
    }

    /// Record the workspace paths allocated for this job.
    pub fn with_paths(mut self, input_path: PathBuf, output_path: PathBuf) -> Self {
        self.input_path = Some(input_path);
        self.output_path = Some(output_path);
        self
    }

    /// Transition to `Running` once input bytes are fully persisted.
    pub fn start(mut self) -> Self {
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        self
    }

    /// Mark the job as succeeded.
    pub fn succeed(mut self) -> Self {
        self.state = JobState::Succeeded;
        self.ended_at = Some(Utc::now());
        self
    }

    /// Mark the job as failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.state = JobState::Failed;
        self.error_message = Some(error.into());
        self.ended_at = Some(Utc::now());
        self
    }

    /// Mark the job as timed out.
    pub fn time_out(mut self) -> Self {
        self.state = JobState::TimedOut;
        self.error_message = Some("analyzer exceeded wall-clock budget".into());
        self.ended_at = Some(Utc::now());
        self
    }

    /// Wall-clock duration from launch to terminal state, if both are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
