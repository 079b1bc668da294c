//! In-memory stand-ins for the pipeline collaborators, shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::analysis::invoker::AnalysisInvoker;
use crate::analysis::models::{ExtractedText, JobDescription, JobReference};
use crate::analysis::pipeline::AnalysisPipeline;
use crate::documents::{artifact_key, DocumentStore, StoreError, UploadedDocument};
use crate::extraction::{ExtractError, TextExtractor};
use crate::job_description::{JobDescriptionResolver, PlaceholderResolver, ResolveError};
use crate::llm_client::{GenerationConfig, GenerativeModel, LlmError};

#[derive(Default)]
struct MemoryStoreInner {
    files: Mutex<HashMap<String, Bytes>>,
    stored_ids: Mutex<Vec<Uuid>>,
    releases: AtomicUsize,
    fail_writes: bool,
    fail_releases: bool,
}

/// Document store backed by a map. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                fail_writes: true,
                ..Default::default()
            }),
        }
    }

    pub fn failing_releases() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                fail_releases: true,
                ..Default::default()
            }),
        }
    }

    pub fn stored_count(&self) -> usize {
        self.inner.stored_ids.lock().unwrap().len()
    }

    pub fn distinct_ids(&self) -> usize {
        let ids = self.inner.stored_ids.lock().unwrap();
        ids.iter().collect::<HashSet<_>>().len()
    }

    pub fn release_count(&self) -> usize {
        self.inner.releases.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.files.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<UploadedDocument, StoreError> {
        if self.inner.fail_writes {
            return Err(StoreError::StorageFailure("medium is read-only".to_string()));
        }
        let id = Uuid::new_v4();
        let key = artifact_key(id, original_name);
        let size_bytes = data.len() as u64;

        self.inner.files.lock().unwrap().insert(key.clone(), data);
        self.inner.stored_ids.lock().unwrap().push(id);

        Ok(UploadedDocument {
            id,
            storage_path: key,
            original_name: original_name.to_string(),
            size_bytes,
            created_at: Utc::now(),
        })
    }

    async fn read(&self, doc: &UploadedDocument) -> Result<Bytes, StoreError> {
        self.inner
            .files
            .lock()
            .unwrap()
            .get(&doc.storage_path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(doc.storage_path.clone()))
    }

    async fn release(&self, doc: UploadedDocument) -> Result<(), StoreError> {
        self.inner.releases.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_releases {
            return Err(StoreError::StorageFailure("unlink refused".to_string()));
        }
        self.inner
            .files
            .lock()
            .unwrap()
            .remove(&doc.storage_path)
            .map(|_| ())
            .ok_or(StoreError::NotFound(doc.storage_path))
    }
}

/// Extractor that treats the upload as UTF-8 text, or fails on purpose.
#[derive(Debug, Clone, Copy)]
pub enum StubExtractor {
    Utf8,
    Corrupt,
    Blank,
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, data: &[u8]) -> Result<ExtractedText, ExtractError> {
        match self {
            StubExtractor::Utf8 => String::from_utf8(data.to_vec())
                .map(ExtractedText::new)
                .map_err(|e| ExtractError::CorruptDocument(e.to_string())),
            StubExtractor::Corrupt => {
                Err(ExtractError::CorruptDocument("xref table missing".to_string()))
            }
            StubExtractor::Blank => Ok(ExtractedText::new("  \n ")),
        }
    }
}

pub struct FailingResolver;

#[async_trait]
impl JobDescriptionResolver for FailingResolver {
    async fn resolve(&self, job: &JobReference) -> Result<JobDescription, ResolveError> {
        Err(ResolveError::UnreachableSource(job.url.clone()))
    }
}

enum Script {
    Reply(String),
    Malformed,
    QuotaExceeded,
}

/// Model that answers from a script and records every prompt it receives.
pub struct ScriptedModel {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn with(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn reply(text: &str) -> Arc<Self> {
        Self::with(Script::Reply(text.to_string()))
    }

    pub fn malformed() -> Arc<Self> {
        Self::with(Script::Malformed)
    }

    pub fn quota_exceeded() -> Arc<Self> {
        Self::with(Script::QuotaExceeded)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Malformed => Err(LlmError::MalformedResponse("no candidates".to_string())),
            Script::QuotaExceeded => Err(LlmError::QuotaExceeded("quota exhausted".to_string())),
        }
    }
}

/// A one-page PDF showing `text` in Helvetica, with a correct xref table.
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

pub struct PipelineBuilder {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    resolver: Arc<dyn JobDescriptionResolver>,
    model: Arc<dyn GenerativeModel>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            extractor: Arc::new(StubExtractor::Utf8),
            resolver: Arc::new(PlaceholderResolver),
            model: ScriptedModel::reply("Score: 75%\n- Keep going"),
        }
    }

    pub fn store(mut self, store: impl DocumentStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn resolver(mut self, resolver: impl JobDescriptionResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.model = model;
        self
    }

    pub fn build(self) -> AnalysisPipeline {
        AnalysisPipeline::new(
            self.store,
            self.extractor,
            self.resolver,
            AnalysisInvoker::new(self.model, GenerationConfig::default(), None),
        )
    }
}
