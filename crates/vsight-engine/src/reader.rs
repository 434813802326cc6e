//! Analyzer output validation.

use std::path::Path;
use tokio::fs;

use vsight_models::AnalysisResult;

use crate::error::{EngineError, EngineResult};

/// Read and validate the analyzer's output artifact.
///
/// Parsing is all-or-nothing: an absent file, an empty file, unparseable
/// JSON, or a shape violation all map to [`EngineError::MalformedOutput`].
/// A partial result is never returned.
pub async fn read_result(output_path: &Path) -> EngineResult<AnalysisResult> {
    let bytes = match fs::read(output_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::malformed_output("output file was not written"));
        }
        Err(e) => return Err(EngineError::Io(e)),
    };

    if bytes.is_empty() {
        return Err(EngineError::malformed_output("output file is empty"));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| EngineError::malformed_output(format!("invalid result JSON: {e}")))
}
