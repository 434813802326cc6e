//! Error types for the orchestration engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while orchestrating an analysis job.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("analyzer not found: {0}")]
    AnalyzerNotFound(String),

    #[error("workspace allocation failed: {0}")]
    WorkspaceAllocation(#[source] std::io::Error),

    #[error("analyzer failed with exit code {exit_code:?}")]
    AnalyzerFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("analyzer timed out after {0} seconds")]
    AnalyzerTimedOut(u64),

    #[error("malformed analyzer output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an analyzer failure error.
    pub fn analyzer_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::AnalyzerFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a malformed output error.
    pub fn malformed_output(reason: impl Into<String>) -> Self {
        Self::MalformedOutput(reason.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable lowercase kind tag, used for metrics labels and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::AnalyzerNotFound(_) => "analyzer_not_found",
            EngineError::WorkspaceAllocation(_) => "workspace_allocation",
            EngineError::AnalyzerFailed { .. } => "analyzer_failed",
            EngineError::AnalyzerTimedOut(_) => "analyzer_timed_out",
            EngineError::MalformedOutput(_) => "malformed_output",
            EngineError::Io(_) => "io",
            EngineError::Internal(_) => "internal",
        }
    }
}
