use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::info;

use super::{ExtractError, TextExtractor};
use crate::analysis::models::ExtractedText;

const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Some producers put junk before the header; readers accept it within 1 KiB.
const SIGNATURE_SEARCH_WINDOW: usize = 1024;
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// Extracts text from PDF uploads with `pdf-extract`.
///
/// Parsing is CPU bound and can panic on hostile input, so it runs on the
/// blocking pool; a panic or timeout is reported as a corrupt document.
///
/// A timed-out parse cannot be cancelled: it keeps its blocking-pool thread
/// and its slot until `pdf-extract` returns. Slots are capped at
/// `MAX_CONCURRENT_EXTRACTIONS`, and waiting for one counts against the timeout.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    timeout: Duration,
    slots: Arc<Semaphore>,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::with_limits(EXTRACTION_TIMEOUT, MAX_CONCURRENT_EXTRACTIONS)
    }
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_limits(timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            timeout,
            slots: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    async fn parse(&self, data: Vec<u8>) -> Result<String, ExtractError> {
        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ExtractError::CorruptDocument(format!("extractor unavailable: {e}")))?;

        tokio::task::spawn_blocking(move || {
            let _slot = slot;
            pdf_extract::extract_text_from_mem(&data).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ExtractError::CorruptDocument(format!("PDF parser aborted: {e}")))?
        .map_err(|e| ExtractError::CorruptDocument(format!("failed to parse PDF: {e}")))
    }
}

fn has_pdf_signature(data: &[u8]) -> bool {
    let window = &data[..data.len().min(SIGNATURE_SEARCH_WINDOW)];
    window
        .windows(PDF_SIGNATURE.len())
        .any(|w| w == PDF_SIGNATURE)
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    async fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        if !has_pdf_signature(data) {
            return Err(ExtractError::UnsupportedFormat(
                "missing %PDF- header".to_string(),
            ));
        }

        let text = tokio::time::timeout(self.timeout, self.parse(data.to_vec()))
            .await
            .map_err(|_| ExtractError::CorruptDocument("PDF extraction timed out".to_string()))??;

        info!(chars = text.chars().count(), "PDF text extraction complete");
        Ok(ExtractedText::new(text))
    }
}
