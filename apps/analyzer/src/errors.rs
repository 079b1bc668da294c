use std::fmt;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::analysis::pipeline::AnalysisError;

/// Client-facing message for every non-validation failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";
pub const RESUME_NOT_FOUND_MESSAGE: &str = "Resume file not found";
pub const JOB_URL_REQUIRED_MESSAGE: &str = "Job URL is required";

/// Failure taxonomy shared by every pipeline component.
/// Kept distinct internally for logging even where the wire contract collapses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    StorageFailure,
    NotFound,
    UnsupportedFormat,
    CorruptDocument,
    UnreachableSource,
    UnsupportedUrl,
    ServiceUnavailable,
    QuotaExceeded,
    MalformedResponse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::CorruptDocument => "corrupt_document",
            ErrorKind::UnreachableSource => "unreachable_source",
            ErrorKind::UnsupportedUrl => "unsupported_url",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::MalformedResponse => "malformed_response",
        }
    }

    /// HTTP status for a failure of this kind. Unexpected internal errors
    /// never reach an `ErrorKind` and are answered with 500 by `AppError`.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::InvalidRequest | ErrorKind::StorageFailure | ErrorKind::NotFound => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::UnsupportedFormat | ErrorKind::CorruptDocument => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::UnreachableSource
            | ErrorKind::UnsupportedUrl
            | ErrorKind::ServiceUnavailable
            | ErrorKind::QuotaExceeded
            | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Multipart(e) => {
                tracing::warn!("Rejected multipart body: {e}");
                (e.status(), e.body_text())
            }
            AppError::Analysis(e) => {
                let kind = e.kind();
                match kind {
                    ErrorKind::InvalidRequest => {
                        tracing::info!(stage = %e.stage, kind = %kind, "Rejected analysis request: {e}");
                        (kind.status(), e.source.to_string())
                    }
                    ErrorKind::StorageFailure | ErrorKind::NotFound => {
                        tracing::error!(stage = %e.stage, kind = %kind, "Resume artifact unavailable: {e}");
                        (kind.status(), RESUME_NOT_FOUND_MESSAGE.to_string())
                    }
                    _ => {
                        tracing::error!(stage = %e.stage, kind = %kind, "Analysis failed: {e}");
                        (kind.status(), GENERIC_FAILURE_MESSAGE.to_string())
                    }
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
