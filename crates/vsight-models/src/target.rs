//! Analyzer execution target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Compute device passed to the analyzer as its third argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTarget {
    /// CPU-only inference
    #[default]
    Cpu,
    /// CUDA-accelerated inference
    Cuda,
}

impl ExecutionTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionTarget::Cpu => "cpu",
            ExecutionTarget::Cuda => "cuda",
        }
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized execution target strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown execution target: {0}")]
pub struct ParseTargetError(pub String);

impl FromStr for ExecutionTarget {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(ExecutionTarget::Cpu),
            "cuda" | "gpu" => Ok(ExecutionTarget::Cuda),
            other => Err(ParseTargetError(other.to_string())),
        }
    }
}
