//! OpenAI-compatible text generator (`POST {endpoint}/chat/completions`).
//!
//! Works against api.openai.com and self-hosted servers exposing the same
//! chat completions shape (vLLM, llama.cpp server, LiteLLM).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{GenerationConfig, GenerationProviderKind};
use crate::error::{ModelError, ModelResult};
use crate::http::{build_client, ensure_success};
use crate::TextGenerator;

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Value,
}

/// Generator backed by an OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl OpenAiGenerator {
    /// Create a new OpenAI-compatible generator.
    ///
    /// The API key is read once from `config.api_key_env`. A missing key is
    /// not an error: self-hosted servers usually don't need one.
    pub fn new(config: &GenerationConfig) -> ModelResult<Self> {
        let client = build_client(PROVIDER, config)?;
        let url = format!("{}/chat/completions", config.effective_endpoint());
        let api_key = config.resolve_api_key();

        if api_key.is_none() {
            warn!(
                "{} not set; sending requests to {} without authorization",
                config.api_key_env, url
            );
        }

        Ok(Self {
            client,
            url,
            model: config.effective_model().to_string(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

/// Flatten `message.content`, which is either a string or a list of parts.
fn content_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> ModelResult<String> {
        let payload = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::request(PROVIDER, e.to_string()))?;

        let response = ensure_success(PROVIDER, response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::invalid_response(PROVIDER, e.to_string()))?;

        let choice = body
            .choices
            .first()
            .ok_or_else(|| ModelError::invalid_response(PROVIDER, "response has no choices"))?;

        debug!(finish_reason = ?choice.finish_reason, "Chat completion received");

        let text = content_text(&choice.message.content);
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::EmptyResponse {
                provider: PROVIDER.to_string(),
                model: self.model.clone(),
            });
        }

        Ok(text.to_string())
    }

    fn provider(&self) -> GenerationProviderKind {
        GenerationProviderKind::OpenAi
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
