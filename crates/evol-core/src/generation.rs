//! The Generation Port: the pipeline's only way to reach a language model.
//!
//! Phases depend on [`GenerationPort`] rather than on a concrete backend.
//! Production runs use [`crate::model_adapter::ModelGenerationPort`]; tests
//! plug in scripted doubles.

use async_trait::async_trait;

use crate::errors::GenerationError;

/// Prompt in, completion text out.
///
/// A failed call must leave no trace beyond its error: the pipeline treats
/// every failure as item-level and carries on with the next item.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Short description for logs and `evol status`.
    fn describe(&self) -> String {
        "generation port".to_string()
    }
}
