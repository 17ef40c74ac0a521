//! Caller-facing response and the request-to-response entry point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::EvolError;
use crate::pipeline::EvolPipeline;
use crate::progress::ProgressSink;
use crate::request::ValidatedRequest;
use crate::types::{Answer, ContextSet, EvolvedQuestion, PipelineResult, SeedQuestion};

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub evolved_questions: Vec<EvolvedQuestion>,
    pub question_answers: Vec<Answer>,
    pub question_contexts: Vec<ContextSet>,
    pub seed_questions: Vec<SeedQuestion>,
    pub total_questions: usize,
    pub target_questions: usize,
    /// Wall-clock seconds spent in the pipeline.
    pub processing_time: f64,
}

impl GenerateResponse {
    /// Wrap a pipeline result.
    ///
    /// # Errors
    ///
    /// [`EvolError::NoQuestionsGenerated`] when the run produced nothing.
    pub fn from_result(result: PipelineResult, elapsed: Duration) -> Result<Self, EvolError> {
        if result.evolved_questions.is_empty() {
            return Err(EvolError::NoQuestionsGenerated);
        }
        Ok(Self {
            total_questions: result.evolved_questions.len(),
            target_questions: result.target_questions,
            evolved_questions: result.evolved_questions,
            question_answers: result.question_answers,
            question_contexts: result.question_contexts,
            seed_questions: result.seed_questions,
            processing_time: elapsed.as_secs_f64(),
        })
    }

    /// Number of answers that are placeholders.
    pub fn placeholder_answers(&self) -> usize {
        self.question_answers.iter().filter(|a| a.placeholder).count()
    }
}

/// Run a validated request to completion.
pub async fn generate(
    pipeline: &EvolPipeline,
    request: ValidatedRequest,
    sink: Option<Arc<dyn ProgressSink>>,
) -> Result<GenerateResponse, EvolError> {
    let started = Instant::now();
    let result = pipeline
        .run(request.documents, request.target_questions, sink)
        .await?;
    let response = GenerateResponse::from_result(result, started.elapsed())?;
    info!(
        "Successfully generated {} questions in {:.2}s",
        response.total_questions, response.processing_time
    );
    Ok(response)
}
