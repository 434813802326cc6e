//! Shared data models for the Vidsight backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - The canonical analysis result shape
//! - Uploaded file metadata
//! - Analyzer execution targets

pub mod analysis;
pub mod job;
pub mod target;
pub mod upload;

// Re-export common types
pub use analysis::AnalysisResult;
pub use job::{Job, JobId, JobState};
pub use target::{ExecutionTarget, ParseTargetError};
pub use upload::UploadedFile;
