//! Text Extractor: turns an uploaded binary resume into plain text.

pub mod pdf;

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::models::ExtractedText;
use crate::errors::ErrorKind;

pub use pdf::PdfTextExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt document: {0}")]
    CorruptDocument(String),
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExtractError::CorruptDocument(_) => ErrorKind::CorruptDocument,
        }
    }
}

/// Parse failures are always reported; an extractor never hands back
/// placeholder text for a document it could not read.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError>;
}
