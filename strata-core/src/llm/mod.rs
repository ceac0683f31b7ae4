//! Text-generation backend interface and the OpenAI-compatible client.

pub mod client;
pub mod prompt;
pub mod repair;

pub use client::OpenAiCompatBackend;
pub use prompt::PromptBundle;

use crate::request::NodeRequest;

/// Common interface to the summarization backend.
///
/// One node is summarized per call; the pipeline awaits each call to
/// completion before building the next request, so implementations never see
/// concurrent traffic from a single run.
#[async_trait::async_trait]
pub trait SummaryBackend: Send + Sync + std::fmt::Debug {
    /// Resolve the model id to use; `None` picks the first served model.
    async fn resolve_model(&self, preferred: Option<&str>) -> crate::error::Result<String>;

    /// Produce the markdown summary body for one node request.
    async fn summarize(
        &self,
        model: &str,
        prompts: &PromptBundle,
        request: &NodeRequest,
    ) -> crate::error::Result<String>;

    /// Produce the strict-JSON codebase analysis for an aggregate request,
    /// decoded through the lenient repair path.
    async fn analyze(
        &self,
        model: &str,
        prompts: &PromptBundle,
        request: &serde_json::Value,
    ) -> crate::error::Result<serde_json::Value>;
}
