//! Canonical analysis result shape.
//!
//! The analyzer writes this object as JSON to the job's output path. Each
//! field is optional on the wire, but a present field must have the correct
//! type; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Structured output of a completed analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Natural-language summary of the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Full transcript of the audio track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Ordered text annotations for detected key frames
    #[serde(default)]
    pub frame_notes: Vec<String>,
}

impl AnalysisResult {
    /// True when the analyzer produced no content at all.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.transcript.is_none() && self.frame_notes.is_empty()
    }
}
