//! Ollama text generator (`POST {endpoint}/api/generate`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GenerationConfig, GenerationProviderKind};
use crate::error::{ModelError, ModelResult};
use crate::http::{build_client, ensure_success};
use crate::TextGenerator;

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Generator backed by a local Ollama runtime.
pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

impl OllamaGenerator {
    /// Create a new Ollama generator.
    pub fn new(config: &GenerationConfig) -> ModelResult<Self> {
        let client = build_client(PROVIDER, config)?;
        let url = format!("{}/api/generate", config.effective_endpoint());

        debug!(url = %url, model = config.effective_model(), "Created Ollama generator");

        Ok(Self {
            client,
            url,
            model: config.effective_model().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> ModelResult<String> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelError::request(PROVIDER, e.to_string()))?;

        let response = ensure_success(PROVIDER, response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::invalid_response(PROVIDER, e.to_string()))?;

        debug!(eval_count = ?body.eval_count, "Ollama completion received");

        let text = body.response.trim();
        if text.is_empty() {
            return Err(ModelError::EmptyResponse {
                provider: PROVIDER.to_string(),
                model: self.model.clone(),
            });
        }

        Ok(text.to_string())
    }

    fn provider(&self) -> GenerationProviderKind {
        GenerationProviderKind::Ollama
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
