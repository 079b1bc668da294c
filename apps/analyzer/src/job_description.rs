//! Job Description Resolver: turns a job posting reference into descriptive text.
//!
//! Only a placeholder ships today: it echoes the URL into a fixed sentence.
//! Fetching and scraping real postings belongs behind this same trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::models::{JobDescription, JobReference};
use crate::errors::ErrorKind;

#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum ResolveError {
    #[error("job posting source unreachable: {0}")]
    UnreachableSource(String),

    #[error("unsupported job URL: {0}")]
    UnsupportedUrl(String),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::UnreachableSource(_) => ErrorKind::UnreachableSource,
            ResolveError::UnsupportedUrl(_) => ErrorKind::UnsupportedUrl,
        }
    }
}

/// A successful resolution always carries text; failures are errors, never
/// an empty description.
#[async_trait]
pub trait JobDescriptionResolver: Send + Sync {
    async fn resolve(&self, job: &JobReference) -> Result<JobDescription, ResolveError>;
}

/// Deterministic stand-in used until posting retrieval exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

#[async_trait]
impl JobDescriptionResolver for PlaceholderResolver {
    async fn resolve(&self, job: &JobReference) -> Result<JobDescription, ResolveError> {
        Ok(JobDescription {
            text: format!("Extracted job description from: {}", job.url),
        })
    }
}
