//! LLM Client: the single point of entry for all Gemini API calls in the analyzer.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All model interactions MUST go through the `GenerativeModel` trait.
//!
//! Model: gemini-2.0-flash (hardcoded, do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::ErrorKind;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for all analysis calls.
pub const MODEL: &str = "gemini-2.0-flash";
/// Transport-level ceiling. The per-call deadline is enforced by the invoker.
const HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Http(_) | LlmError::Api { .. } | LlmError::DeadlineExceeded(_) => {
                ErrorKind::ServiceUnavailable
            }
            LlmError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            LlmError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

/// Sampling and length parameters for every model call.
/// Built once at startup and injected into the invoker; never request-derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// The generative-text capability: one prompt in, one text reply out.
///
/// Implementations must treat each call as a fresh single-turn exchange.
/// A reply without candidate text is reported as `LlmError::MalformedResponse`.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. No retries: a failed call is surfaced to
/// the caller, who may resubmit.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/models/{MODEL}:generateContent")
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerateContentResponse, LlmError> {
        // Empty history: every analysis is a fresh single-turn session.
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(classify_failure(status, &body));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        let response = self.call(prompt, config).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse("no candidate text in reply".to_string()))
    }
}

/// Maps a non-success HTTP status and body to an `LlmError`.
fn classify_failure(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::QuotaExceeded(message)
    } else {
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
