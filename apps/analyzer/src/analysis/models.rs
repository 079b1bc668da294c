use serde::{Serialize, Serializer};

/// Plain text pulled out of one uploaded resume. May be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub content: String,
}

impl ExtractedText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// True when the extractor produced nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Caller-supplied job posting reference. Only checked for non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReference {
    pub url: String,
}

impl JobReference {
    /// Returns `None` when the URL is missing or whitespace-only.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let url = raw?.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub text: String,
}

/// The single instruction prompt sent to the model for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub text: String,
    /// Identifier of the template that produced `text`.
    pub template_version: &'static str,
}

/// Unstructured model output, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelReply {
    pub text: String,
}

impl RawModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Suitability score. Serializes as a bare integer or the string `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Percent(u8),
    Unknown,
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Percent(value) => serializer.serialize_u8(*value),
            Score::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

/// Final structured output returned to the caller. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub score: Score,
    pub suggestions: String,
}
