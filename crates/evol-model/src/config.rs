//! Configuration types for evol-model.
//!
//! [`GenerationConfig`] is the canonical generation configuration. Other
//! crates embed or re-export it rather than defining duplicates.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Default OpenAI-compatible base URL.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default model for OpenAI-compatible endpoints.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default model for Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Environment variable holding the API key for OpenAI-compatible endpoints.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

// ============================================================================
// GenerationProviderKind
// ============================================================================

/// Generation provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    /// OpenAI-compatible chat completions API.
    #[default]
    #[serde(alias = "open_ai", alias = "open-ai")]
    OpenAi,
    /// Local Ollama runtime.
    Ollama,
}

impl GenerationProviderKind {
    /// Base URL used when no endpoint is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_ENDPOINT,
            Self::Ollama => DEFAULT_OLLAMA_ENDPOINT,
        }
    }

    /// Model used when no model is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

impl std::fmt::Display for GenerationProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for GenerationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" | "open-ai" => Ok(Self::OpenAi),
            "ollama" | "local" => Ok(Self::Ollama),
            _ => Err(format!(
                "Unknown provider: '{}'. Use 'openai' or 'ollama'.",
                s
            )),
        }
    }
}

// ============================================================================
// GenerationConfig
// ============================================================================

/// Configuration for a text generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: GenerationProviderKind,

    /// Model identifier. Falls back to the provider default when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL. Falls back to the provider default when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds. `None` means requests never time out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::default(),
            model: None,
            endpoint: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: None,
        }
    }
}

impl GenerationConfig {
    /// Effective model identifier.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Effective base URL, without a trailing slash.
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Read the API key from the configured environment variable.
    ///
    /// Empty values are treated as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    /// Create a config for a specific provider with its defaults.
    pub fn for_provider(provider: GenerationProviderKind) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Check values that would make every request fail.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidConfig` for a temperature outside `[0, 2]`,
    /// a zero token cap, a zero timeout, or a non-HTTP endpoint.
    pub fn validate(&self) -> ModelResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ModelError::InvalidConfig {
                message: format!(
                    "temperature={} is outside the supported range 0.0-2.0",
                    self.temperature
                ),
            });
        }

        if self.max_tokens == 0 {
            return Err(ModelError::InvalidConfig {
                message: "maxTokens cannot be 0".to_string(),
            });
        }

        if self.timeout_secs == Some(0) {
            return Err(ModelError::InvalidConfig {
                message: "timeoutSecs cannot be 0; omit it to disable timeouts".to_string(),
            });
        }

        let endpoint = self.effective_endpoint();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ModelError::InvalidConfig {
                message: format!("endpoint '{}' must start with http:// or https://", endpoint),
            });
        }

        Ok(())
    }
}
