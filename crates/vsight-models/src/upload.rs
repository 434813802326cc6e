//! Uploaded file wrapper.

use serde::{Deserialize, Serialize};

/// Maximum length of an inferred extension.
const MAX_EXTENSION_LEN: usize = 8;

/// Raw uploaded bytes plus the client-supplied display name.
///
/// The display name is metadata for logging and extension inference only.
/// It never participates in path construction; workspace paths are keyed by
/// the generated job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Client-supplied display name (e.g. from the multipart filename)
    pub file_name: Option<String>,
    /// Raw media bytes
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { file_name, bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Infer a filesystem-safe extension from the display name.
    ///
    /// Only ASCII alphanumerics survive, lowercased and length-bounded, so
    /// traversal sequences or reserved characters in a hostile filename can
    /// never reach a path. Falls back to `bin`.
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(sanitized_extension)
            .unwrap_or_else(|| "bin".to_string())
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let raw = name.rsplit_once('.').map(|(_, ext)| ext)?;
    let ext: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
