//! Error types for evol-core.

use thiserror::Error;

/// Failure of a single Generation Port call.
///
/// Always item-level: the phase that hit it skips (or placeholders) the
/// affected item and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The backend call failed (transport, status, malformed body).
    #[error("{0}")]
    Backend(String),

    /// The backend answered with nothing usable.
    #[error("empty completion")]
    EmptyResponse,

    /// The backend is not configured or not compiled in.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
}

/// Domain-specific errors for Evol pipeline operations.
#[derive(Error, Debug)]
pub enum EvolError {
    /// The request contained no documents.
    #[error("At least one document is required")]
    NoDocuments,

    /// Every supplied document was blank after trimming.
    #[error("All documents appear to be empty")]
    AllDocumentsEmpty,

    /// A document reached the pipeline with blank content.
    #[error("Document {index} has no content")]
    BlankDocument {
        /// Position of the blank document.
        index: usize,
    },

    /// The target question count is outside the supported range.
    #[error("target_questions must be between {min} and {max}, got {value}")]
    TargetOutOfRange {
        /// Requested value.
        value: i64,
        /// Lower bound (inclusive).
        min: usize,
        /// Upper bound (inclusive).
        max: usize,
    },

    /// Invalid argument provided at the boundary.
    #[error("{0}")]
    InvalidRequest(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// The generation backend could not be created.
    #[error("Generation backend unavailable ({provider}): {reason}")]
    GeneratorUnavailable {
        /// Provider name.
        provider: String,
        /// Why it could not be created.
        reason: String,
    },

    /// A Generation Port call failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Pipeline state violates a lineage or index invariant.
    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    /// A phase failed; remaining phases were skipped.
    #[error("Pipeline error: {0}")]
    PipelineFailed(String),

    /// The run finished but produced no evolved questions.
    #[error("No questions were generated. Please check your documents and try again.")]
    NoQuestionsGenerated,

    /// The progress stream task ended without a result.
    #[error("Progress stream failed: {0}")]
    Stream(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
