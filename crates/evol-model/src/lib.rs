//! # evol-model
//!
//! Text-generation layer for the Evol pipeline.
//!
//! This crate is the **single source of truth** for talking to LLM runtimes.
//! It provides:
//!
//! - **Text generators**: prompt in, completion text out
//! - **Unified config**: provider, model, endpoint and sampling settings
//! - **Structured errors**: transport, status and response failures
//!
//! ## Design Principles
//!
//! 1. **Production-only**: No mock implementations. Test doubles live in consuming crates.
//! 2. **Provider-agnostic**: The [`TextGenerator`] trait doesn't leak HTTP details.
//! 3. **No hidden timeouts**: A request only times out when `timeout_secs` is configured.
//!
//! ## Features
//!
//! - `ollama` (default): Local inference via the Ollama `/api/generate` endpoint
//! - `openai` (default): Any OpenAI-compatible `/chat/completions` endpoint
//!
//! ## Usage
//!
//! ```ignore
//! use evol_model::{create_text_generator, GenerationConfig};
//!
//! let config = GenerationConfig::default();
//! let generator = create_text_generator(&config)?;
//!
//! let text = generator.generate("Write one question about Rust ownership.").await?;
//! ```

use async_trait::async_trait;

pub mod config;
pub mod error;

mod http;

#[cfg(feature = "ollama")]
mod ollama;

#[cfg(feature = "openai")]
mod openai;

// Re-export error types
pub use error::{ModelError, ModelResult};

// Re-export config types (canonical source of truth)
pub use config::{
    GenerationConfig, GenerationProviderKind, DEFAULT_API_KEY_ENV, DEFAULT_MAX_TOKENS,
    DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_ENDPOINT, DEFAULT_OPENAI_MODEL,
    DEFAULT_TEMPERATURE,
};

// ============================================================================
// Text Generator Trait
// ============================================================================

/// Trait for text-generation backends.
///
/// A generator turns a single prompt into a single completion. Implementations
/// must not retry internally; callers decide how to treat a failed call.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one generator can serve a whole
/// pipeline run from any tokio worker.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate a completion for `prompt`.
    ///
    /// # Returns
    ///
    /// The completion text with surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] on transport failure, non-success status,
    /// malformed body, or an empty completion.
    async fn generate(&self, prompt: &str) -> ModelResult<String>;

    /// Provider backing this generator.
    fn provider(&self) -> GenerationProviderKind;

    /// Model identifier sent with each request.
    fn model_id(&self) -> &str;
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create a text generator from configuration.
///
/// # Errors
///
/// Returns `ModelError::ProviderNotAvailable` when the provider's feature is
/// disabled, or `ModelError::InvalidConfig` when the configuration is unusable.
pub fn create_text_generator(config: &GenerationConfig) -> ModelResult<Box<dyn TextGenerator>> {
    config.validate()?;

    match config.provider {
        #[cfg(feature = "ollama")]
        GenerationProviderKind::Ollama => Ok(Box::new(ollama::OllamaGenerator::new(config)?)),

        #[cfg(feature = "openai")]
        GenerationProviderKind::OpenAi => Ok(Box::new(openai::OpenAiGenerator::new(config)?)),

        #[allow(unreachable_patterns)]
        other => Err(ModelError::ProviderNotAvailable {
            provider: other.to_string(),
            reason: format!("Rebuild evol-model with the '{}' feature enabled.", other),
        }),
    }
}

// ============================================================================
// Re-export implementations (feature-gated)
// ============================================================================

#[cfg(feature = "ollama")]
pub use ollama::OllamaGenerator;

#[cfg(feature = "openai")]
pub use openai::OpenAiGenerator;
