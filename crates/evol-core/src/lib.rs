//! # evol-core
//!
//! **Evol** – synthetic question-evolution pipeline.
//!
//! Given a handful of source documents, the pipeline generates seed
//! questions, evolves them three ways (simple, multi-context, reasoning),
//! answers every evolved question and attaches supporting excerpts. It is
//! consumed by the `evol` CLI and other Rust tools.
//!
//! ## Main Types
//!
//! - [`EvolPipeline`] – runs the six phases against a [`GenerationPort`]
//! - [`GenerateRequest`] / [`GenerateResponse`] – boundary request and response
//! - [`ProgressEvent`] – structured progress notifications
//! - [`EvolError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`config`] – configuration (`EvolConfig`, `PipelineLimits`)
//! - [`phases`] – the six phase functions
//! - [`pipeline`] – the orchestrator
//! - [`progress`] – progress events, sinks, per-run channels
//! - [`relevance`] – keyword-overlap context scoring
//! - [`stream`] – NDJSON progress stream
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use evol_core::{demo_request, generate, EvolConfig, EvolPipeline, ModelGenerationPort};
//!
//! let config = EvolConfig::load_default()?;
//! let port = ModelGenerationPort::from_config(&config.generation)?;
//! let pipeline = EvolPipeline::new(Arc::new(port), config.pipeline.clone());
//!
//! let request = demo_request().validate()?;
//! let response = generate(&pipeline, request, None).await?;
//! println!("{} questions", response.total_questions);
//! ```

// Modules
pub mod config;
pub mod errors;
pub mod generation;
pub mod lineage;
pub mod model_adapter;
pub mod phases;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod relevance;
pub mod request;
pub mod response;
pub mod state;
pub mod stream;
pub mod text;
pub mod types;

// Re-exports for convenience
pub use config::{
    EvolConfig, PipelineLimits, DEFAULT_TARGET_QUESTIONS, MAX_TARGET_QUESTIONS,
    MIN_TARGET_QUESTIONS,
};
pub use errors::{EvolError, GenerationError};
pub use generation::GenerationPort;
pub use lineage::{verify_lineage, QuestionId};
pub use phases::{PhaseOutcome, PLACEHOLDER_ANSWER};
pub use pipeline::{validate_input, EvolPipeline};
pub use progress::{
    progress_channel, ChannelSink, FnSink, ProgressEmitter, ProgressEvent, ProgressEventKind,
    ProgressReceiver, ProgressSink, SinkError,
};
pub use request::{clamp_target, demo_request, example_request_json, GenerateRequest, ValidatedRequest};
pub use response::{generate, GenerateResponse};
pub use state::{Phase, PipelineState};
pub use stream::{run_streaming, write_ndjson, StreamFrame};
pub use types::{
    Answer, ContextSet, Document, EvolutionType, EvolutionTypeInfo, EvolvedQuestion, Metadata,
    PipelineResult, SeedQuestion,
};

// evol-model adapter - for bridging the text-generation backends
pub use model_adapter::{from_model_error, IntoEvolResult, ModelGenerationPort};

// Backend configuration lives in evol-model; re-exported so callers need one crate.
pub use evol_model::{GenerationConfig, GenerationProviderKind};
