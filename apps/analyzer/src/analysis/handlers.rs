//! Axum route handler for the Analysis API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    Json,
};
use tracing::{debug, warn};

use crate::analysis::models::AnalysisResult;
use crate::analysis::pipeline::{AnalysisRequest, Upload};
use crate::errors::AppError;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_URL_FIELD: &str = "jobUrl";
/// Used when the client sends the resume part without a file name.
const FALLBACK_FILE_NAME: &str = "resume.pdf";

/// POST /analyze
///
/// Multipart form with a `resume` file and a `jobUrl` text field.
/// Returns `{ "score": <0-100 | "Unknown">, "suggestions": "..." }`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let request = match multipart {
        Ok(multipart) => read_analysis_form(multipart).await?,
        // Not a multipart body: nothing usable was sent, validation reports it.
        Err(rejection) => {
            warn!("Analyze request without multipart body: {rejection}");
            AnalysisRequest::default()
        }
    };

    // Detached so that a client disconnect cannot cancel the run before the
    // stored upload is released.
    let pipeline = state.pipeline.clone();
    let result = tokio::spawn(async move { pipeline.run(request).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("analysis task aborted: {e}")))??;

    Ok(Json(result))
}

async fn read_analysis_form(mut multipart: Multipart) -> Result<AnalysisRequest, MultipartError> {
    let mut request = AnalysisRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(FALLBACK_FILE_NAME)
                    .to_string();
                let data = field.bytes().await?;
                debug!("Received resume {} ({} bytes)", file_name, data.len());
                request.resume = Some(Upload { file_name, data });
            }
            Some(JOB_URL_FIELD) => {
                request.job_url = Some(field.text().await?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(request)
}
