//! Adapter layer for evol-model backends.
//!
//! Bridges `evol_model::TextGenerator` into the core [`GenerationPort`] and
//! converts `ModelError` into core error types.
//!
//! ```text
//! evol-core phases
//!        ↓
//!   GenerationPort
//!        ↓
//!   model_adapter (this module)
//!        ↓
//!   evol-model backends (Ollama, OpenAI-compatible)
//! ```

use async_trait::async_trait;
use evol_model::{GenerationConfig, ModelError, TextGenerator};

use crate::errors::{EvolError, GenerationError};
use crate::generation::GenerationPort;

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert an evol-model error to an evol-core error.
pub fn from_model_error(err: ModelError) -> EvolError {
    match err {
        ModelError::InvalidConfig { message } => EvolError::InvalidConfiguration {
            message,
            hint: "Check the generation section of ~/.evol/config.yaml".to_string(),
        },

        ModelError::ProviderNotAvailable { provider, reason } => {
            EvolError::GeneratorUnavailable { provider, reason }
        }

        other => EvolError::Generation(to_generation_error(other)),
    }
}

/// Convert an evol-model error into an item-level generation failure.
pub fn to_generation_error(err: ModelError) -> GenerationError {
    match err {
        ModelError::EmptyResponse { .. } => GenerationError::EmptyResponse,
        ModelError::ProviderNotAvailable { provider, reason } => {
            GenerationError::Unavailable(format!("{}: {}", provider, reason))
        }
        other => GenerationError::Backend(other.to_string()),
    }
}

/// Extension trait for converting `ModelResult` to core results.
pub trait IntoEvolResult<T> {
    /// Convert to `Result<T, EvolError>`.
    fn into_evol_result(self) -> Result<T, EvolError>;
}

impl<T> IntoEvolResult<T> for Result<T, ModelError> {
    fn into_evol_result(self) -> Result<T, EvolError> {
        self.map_err(from_model_error)
    }
}

// ============================================================================
// ModelGenerationPort
// ============================================================================

/// [`GenerationPort`] backed by an evol-model [`TextGenerator`].
#[derive(Debug)]
pub struct ModelGenerationPort {
    inner: Box<dyn TextGenerator>,
}

impl ModelGenerationPort {
    /// Wrap an existing generator.
    pub fn new(inner: Box<dyn TextGenerator>) -> Self {
        Self { inner }
    }

    /// Build the backend named by `config`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, EvolError> {
        let inner = evol_model::create_text_generator(config).into_evol_result()?;
        tracing::debug!(
            provider = %inner.provider(),
            model = inner.model_id(),
            "Created text generator"
        );
        Ok(Self::new(inner))
    }
}

#[async_trait]
impl GenerationPort for ModelGenerationPort {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.inner.generate(prompt).await.map_err(to_generation_error)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.inner.provider(), self.inner.model_id())
    }
}
