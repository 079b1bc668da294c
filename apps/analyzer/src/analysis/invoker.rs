//! Analysis Invoker: sends one prompt to the generative model and returns its raw reply.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::analysis::models::{AnalysisPrompt, RawModelReply};
use crate::llm_client::{GenerationConfig, GenerativeModel, LlmError};

/// Reply text used when the model answers without any candidate text.
pub const NO_RESPONSE_SENTINEL: &str = "No response received";

/// Holds the model and the process-wide generation config it is always called with.
#[derive(Clone)]
pub struct AnalysisInvoker {
    model: Arc<dyn GenerativeModel>,
    config: GenerationConfig,
    default_deadline: Option<Duration>,
}

impl AnalysisInvoker {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        config: GenerationConfig,
        default_deadline: Option<Duration>,
    ) -> Self {
        Self {
            model,
            config,
            default_deadline,
        }
    }

    pub async fn invoke(&self, prompt: &AnalysisPrompt) -> Result<RawModelReply, LlmError> {
        self.invoke_with_deadline(prompt, self.default_deadline).await
    }

    /// Calls the model, failing with `DeadlineExceeded` if `deadline` elapses first.
    ///
    /// A malformed reply (no candidate text) is not an error here: it becomes
    /// the `NO_RESPONSE_SENTINEL` reply so the caller still gets a result.
    pub async fn invoke_with_deadline(
        &self,
        prompt: &AnalysisPrompt,
        deadline: Option<Duration>,
    ) -> Result<RawModelReply, LlmError> {
        let call = self.model.complete(&prompt.text, &self.config);

        let outcome = match deadline {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| LlmError::DeadlineExceeded(limit))?,
            None => call.await,
        };

        match outcome {
            Ok(text) => Ok(RawModelReply::new(text)),
            Err(LlmError::MalformedResponse(reason)) => {
                warn!(
                    template = prompt.template_version,
                    "Model reply was malformed ({reason}); using sentinel reply"
                );
                Ok(RawModelReply::new(NO_RESPONSE_SENTINEL))
            }
            Err(e) => Err(e),
        }
    }
}
