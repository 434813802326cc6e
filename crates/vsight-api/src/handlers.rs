//! Request handlers.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use vsight_models::{AnalysisResult, UploadedFile};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the media upload.
const FILE_FIELD: &str = "file";

/// Analyze an uploaded video.
///
/// Accepts a multipart body with a `file` field, runs one analysis job to a
/// terminal state, and returns the validated result. The call suspends until
/// the job finishes; unrelated requests keep being served meanwhile.
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let mut multipart = multipart.map_err(|_| ApiError::NoFileProvided)?;

    let upload = extract_upload(&mut multipart).await?;
    debug!(
        source = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.len(),
        "upload received"
    );

    let result = state.orchestrator.submit(upload).await?;
    Ok(Json(result))
}

/// Pull the `file` field out of the multipart stream.
///
/// A missing field and an empty file both mean no usable upload; no job or
/// workspace is ever created for them.
async fn extract_upload(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;

        let upload = UploadedFile::new(file_name, bytes.to_vec());
        if upload.is_empty() {
            return Err(ApiError::NoFileProvided);
        }
        return Ok(upload);
    }

    Err(ApiError::NoFileProvided)
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub work_dir: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }
}

/// Readiness check endpoint. Verifies the work directory is writable.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let probe = state
        .orchestrator
        .work_dir()
        .join(format!(".ready-{}", Uuid::new_v4()));

    let work_dir_check = match tokio::fs::write(&probe, b"ok").await {
        Ok(()) => {
            let _ = tokio::fs::remove_file(&probe).await;
            CheckStatus::ok()
        }
        Err(e) => CheckStatus::error(e.to_string()),
    };

    let all_ok = work_dir_check.status == "ok";
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            work_dir: work_dir_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
