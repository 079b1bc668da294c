//! Pipeline Orchestrator: runs one resume analysis end to end.
//!
//! Flow: Validating → Storing → Extracting → Resolving → Prompting →
//!       Invoking → Parsing → Cleaning → Done
//!
//! Any failure after the upload is stored still goes through Cleaning before
//! ending in Failed, so the stored artifact is released exactly once per run.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::invoker::AnalysisInvoker;
use crate::analysis::models::{AnalysisResult, JobReference};
use crate::analysis::parser::parse_reply;
use crate::analysis::prompts::build_analysis_prompt;
use crate::documents::{DocumentStore, StoreError, UploadedDocument};
use crate::errors::{ErrorKind, JOB_URL_REQUIRED_MESSAGE, RESUME_NOT_FOUND_MESSAGE};
use crate::extraction::{ExtractError, TextExtractor};
use crate::job_description::{JobDescriptionResolver, ResolveError};
use crate::llm_client::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Storing,
    Extracting,
    Resolving,
    Prompting,
    Invoking,
    Parsing,
    Cleaning,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Storing => "storing",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Resolving => "resolving",
            PipelineStage::Prompting => "prompting",
            PipelineStage::Invoking => "invoking",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Cleaning => "cleaning",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

/// Raw inputs of one analysis, before validation.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub resume: Option<Upload>,
    pub job_url: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", JOB_URL_REQUIRED_MESSAGE)]
    MissingJobUrl,

    #[error("{}", RESUME_NOT_FOUND_MESSAGE)]
    MissingResume,
}

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("resume contains no extractable text")]
    EmptyText,

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error(transparent)]
    Model(#[from] LlmError),
}

impl FailureCause {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FailureCause::Invalid(_) => ErrorKind::InvalidRequest,
            FailureCause::Storage(e) => e.kind(),
            FailureCause::Extraction(e) => e.kind(),
            FailureCause::EmptyText => ErrorKind::CorruptDocument,
            FailureCause::Resolution(e) => e.kind(),
            FailureCause::Model(e) => e.kind(),
        }
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct AnalysisError {
    pub stage: PipelineStage,
    pub source: FailureCause,
}

impl AnalysisError {
    pub fn new(stage: PipelineStage, source: impl Into<FailureCause>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

fn at<E: Into<FailureCause>>(stage: PipelineStage) -> impl FnOnce(E) -> AnalysisError {
    move |e| AnalysisError::new(stage, e)
}

fn enter(stage: PipelineStage) {
    debug!(stage = %stage, "Pipeline stage");
}

/// Sequences the analysis components. Shared across requests; holds no
/// per-request state.
pub struct AnalysisPipeline {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    resolver: Arc<dyn JobDescriptionResolver>,
    invoker: AnalysisInvoker,
}

impl AnalysisPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn TextExtractor>,
        resolver: Arc<dyn JobDescriptionResolver>,
        invoker: AnalysisInvoker,
    ) -> Self {
        Self {
            store,
            extractor,
            resolver,
            invoker,
        }
    }

    /// Runs one analysis. The stored upload is released before this returns,
    /// whatever the outcome; a failed release is logged and otherwise ignored.
    #[tracing::instrument(skip_all, fields(run_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        enter(PipelineStage::Validating);
        let (job, upload) = validate(request).map_err(at(PipelineStage::Validating))?;

        enter(PipelineStage::Storing);
        let doc = self
            .store
            .store(upload.data, &upload.file_name)
            .await
            .map_err(at(PipelineStage::Storing))?;
        info!(
            "Stored resume {} ({} bytes) for {}",
            doc.original_name, doc.size_bytes, job.url
        );

        let outcome = self.process(&doc, &job).await;

        enter(PipelineStage::Cleaning);
        let doc_id = doc.id;
        if let Err(e) = self.store.release(doc).await {
            warn!("Failed to release upload {doc_id}: {e}");
        }

        match &outcome {
            Ok(_) => enter(PipelineStage::Done),
            Err(e) => {
                enter(PipelineStage::Failed);
                debug!(kind = %e.kind(), "Run failed at {}", e.stage);
            }
        }
        outcome
    }

    async fn process(
        &self,
        doc: &UploadedDocument,
        job: &JobReference,
    ) -> Result<AnalysisResult, AnalysisError> {
        enter(PipelineStage::Extracting);
        let data = self
            .store
            .read(doc)
            .await
            .map_err(at(PipelineStage::Extracting))?;
        let text = self
            .extractor
            .extract(&data)
            .await
            .map_err(at(PipelineStage::Extracting))?;
        if text.is_blank() {
            return Err(AnalysisError::new(
                PipelineStage::Extracting,
                FailureCause::EmptyText,
            ));
        }

        enter(PipelineStage::Resolving);
        let description = self
            .resolver
            .resolve(job)
            .await
            .map_err(at(PipelineStage::Resolving))?;

        enter(PipelineStage::Prompting);
        let prompt = build_analysis_prompt(&text, &description);

        enter(PipelineStage::Invoking);
        let reply = self
            .invoker
            .invoke(&prompt)
            .await
            .map_err(at(PipelineStage::Invoking))?;

        enter(PipelineStage::Parsing);
        let parsed = parse_reply(&reply);
        if parsed.diagnostics.is_ambiguous() {
            warn!(
                template = prompt.template_version,
                percent_runs = parsed.diagnostics.percent_runs,
                discarded_chars = parsed.diagnostics.discarded_chars,
                "Model reply holds several percentages; suggestions were cut at the last one"
            );
        }
        info!("Analysis complete: score={:?}", parsed.result.score);

        Ok(parsed.result)
    }
}

/// Job URL is checked before the resume.
fn validate(request: AnalysisRequest) -> Result<(JobReference, Upload), ValidationError> {
    let job = JobReference::parse(request.job_url.as_deref()).ok_or(ValidationError::MissingJobUrl)?;
    let upload = request
        .resume
        .filter(|u| !u.data.is_empty())
        .ok_or(ValidationError::MissingResume)?;
    Ok((job, upload))
}
