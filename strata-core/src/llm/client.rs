// OpenAI-compatible backend client (llama.cpp, vLLM, or any /v1 server).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, StrataError};
use crate::request::NodeRequest;

use super::{PromptBundle, SummaryBackend, repair};

#[derive(Debug)]
pub struct OpenAiCompatBackend {
    client: Client,
    base_url: String,
}

impl OpenAiCompatBackend {
    /// `base_url` is the server root (e.g. `http://localhost:8080`); a
    /// trailing slash is tolerated. `timeout` governs every call.
    pub fn new(base_url: &str, timeout: Duration) -> crate::error::Result<Self> {
        let base = base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(StrataError::Llm(LlmError::Config(
                "backend base URL must not be empty".to_string(),
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StrataError::Llm(LlmError::Network(e.to_string())))?;
        Ok(Self {
            client,
            base_url: base,
        })
    }

    async fn chat(&self, model: &str, content: String) -> crate::error::Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = ChatRequest {
            model: model.to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
        };

        debug!(model, url = %url, "Calling backend");

        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| StrataError::Llm(LlmError::Network(e.to_string())))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StrataError::Llm(LlmError::Api { status, body }));
        }

        let result: ChatResponse = resp
            .json()
            .await
            .map_err(|e| StrataError::Llm(LlmError::Parse(e.to_string())))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(StrataError::Llm(LlmError::MissingContent))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait::async_trait]
impl SummaryBackend for OpenAiCompatBackend {
    async fn resolve_model(&self, preferred: Option<&str>) -> crate::error::Result<String> {
        if let Some(model) = preferred {
            if !model.trim().is_empty() {
                return Ok(model.to_string());
            }
        }

        let url = format!("{}/v1/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StrataError::Llm(LlmError::Network(e.to_string())))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StrataError::Llm(LlmError::Api { status, body }));
        }

        let models: ModelsResponse = resp
            .json()
            .await
            .map_err(|e| StrataError::Llm(LlmError::Parse(e.to_string())))?;

        models
            .data
            .into_iter()
            .map(|m| m.id)
            .find(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                StrataError::Llm(LlmError::Config(
                    "no models returned from /v1/models".to_string(),
                ))
            })
    }

    async fn summarize(
        &self,
        model: &str,
        prompts: &PromptBundle,
        request: &NodeRequest,
    ) -> crate::error::Result<String> {
        let request_json =
            serde_json::to_string(request).map_err(|e| StrataError::Llm(e.into()))?;
        self.chat(model, prompts.summary_instruction(&request_json))
            .await
    }

    async fn analyze(
        &self,
        model: &str,
        prompts: &PromptBundle,
        request: &serde_json::Value,
    ) -> crate::error::Result<serde_json::Value> {
        let reply = self
            .chat(model, prompts.analysis_instruction(&request.to_string()))
            .await?;
        repair::parse_object(&reply).map_err(StrataError::Llm)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
