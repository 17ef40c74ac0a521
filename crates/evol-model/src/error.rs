//! Error types for evol-model.
//!
//! Errors name the provider that failed and, for HTTP status failures, carry
//! a truncated response body so the cause is visible in logs.

use thiserror::Error;

/// Result type alias for evol-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in evol-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Configuration errors
    // ========================================================================
    /// Generation configuration is unusable.
    #[error("Invalid generation configuration: {message}")]
    InvalidConfig { message: String },

    /// Provider not compiled in or not reachable.
    #[error("Provider '{provider}' not available: {reason}")]
    ProviderNotAvailable { provider: String, reason: String },

    // ========================================================================
    // Request errors
    // ========================================================================
    /// The HTTP request could not be sent or the body could not be read.
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// The endpoint answered with a non-success status.
    #[error("{provider} error {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Invalid {provider} response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// The completion was empty after trimming.
    #[error("{provider} returned an empty completion for model '{model}'")]
    EmptyResponse { provider: String, model: String },

    // ========================================================================
    // Serialization errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error constructors
// ============================================================================

impl ModelError {
    /// Create a request error.
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is tied to configuration rather than a single call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::ProviderNotAvailable { .. }
        )
    }
}
