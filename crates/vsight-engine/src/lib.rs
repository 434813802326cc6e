//! Job orchestration core for the Vidsight backend.
//!
//! This crate turns an uploaded file into an isolated, trackable unit of
//! work, runs the external analyzer against it under resource and time
//! constraints, and returns exactly one validated result or a precise
//! failure. It owns:
//! - per-job workspace allocation and guaranteed cleanup
//! - analyzer process lifecycle (argv invocation, timeout, kill)
//! - strict output validation
//! - the bounded-concurrency `submit` facade

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod reader;
pub mod runner;
pub mod workspace;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::Orchestrator;
pub use reader::read_result;
pub use runner::{AnalyzerRunner, RunOutcome};
pub use workspace::{Workspace, WorkspaceManager};
