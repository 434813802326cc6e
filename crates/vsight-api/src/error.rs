//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use vsight_engine::EngineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFileProvided,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFileProvided | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Engine failures collapse to generic
    /// text; paths and analyzer stderr never cross the HTTP boundary.
    fn client_message(&self) -> String {
        match self {
            ApiError::NoFileProvided => "No file uploaded".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            ApiError::Engine(e) => match e {
                EngineError::AnalyzerFailed { .. } => "Video analysis failed".to_string(),
                EngineError::AnalyzerTimedOut(_) => "Video analysis timed out".to_string(),
                EngineError::MalformedOutput(_) => {
                    "Analyzer produced invalid output".to_string()
                }
                _ => "An internal error occurred".to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Engine(e) => warn!(kind = e.kind(), error = %e, "request failed"),
            ApiError::Internal(msg) => error!(error = %msg, "request failed"),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}
