//! The pipeline orchestrator.
//!
//! [`EvolPipeline::run`] validates its input, then drives the six phases in
//! fixed order over one [`PipelineState`]. The first phase-level failure
//! stops the run: later phases are skipped and the caller gets
//! [`EvolError::PipelineFailed`] instead of partial results.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{PipelineLimits, MAX_TARGET_QUESTIONS, MIN_TARGET_QUESTIONS};
use crate::errors::EvolError;
use crate::generation::GenerationPort;
use crate::lineage::verify_lineage;
use crate::phases::{run_phase, PhaseContext, PhaseOutcome};
use crate::progress::{ProgressEmitter, ProgressSink};
use crate::state::{expected_questions, Phase, PipelineState};
use crate::types::{Document, EvolutionType, PipelineResult};

/// Runs the question-evolution pipeline against one generation backend.
///
/// Cheap to share: runs do not touch each other's state.
#[derive(Clone)]
pub struct EvolPipeline {
    port: Arc<dyn GenerationPort>,
    limits: PipelineLimits,
}

impl EvolPipeline {
    pub fn new(port: Arc<dyn GenerationPort>, limits: PipelineLimits) -> Self {
        Self { port, limits }
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    /// Description of the generation backend.
    pub fn describe(&self) -> String {
        self.port.describe()
    }

    /// Run all phases over `documents`.
    ///
    /// # Errors
    ///
    /// Input errors (`NoDocuments`, `BlankDocument`, `TargetOutOfRange`) are
    /// returned before any phase runs. A phase-level failure or a lineage
    /// violation yields [`EvolError::PipelineFailed`].
    pub async fn run(
        &self,
        documents: Vec<Document>,
        target_questions: usize,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Result<PipelineResult, EvolError> {
        validate_input(&documents, target_questions)?;

        let emitter = ProgressEmitter::new(sink);
        let state = PipelineState::new(documents, target_questions);
        self.drive(state, &emitter).await
    }

    async fn drive(&self, mut state: PipelineState, emitter: &ProgressEmitter) -> Result<PipelineResult, EvolError> {
        let target = state.target_questions;
        let expected = expected_questions(target, state.documents.len());

        info!(
            run_id = %emitter.run_id(),
            documents = state.documents.len(),
            target,
            "Starting evolution pipeline"
        );
        emitter.start(
            format!(
                "Starting evolution pipeline with {} documents",
                state.documents.len()
            ),
            json!({
                "documents": state.documents.len(),
                "target_questions": target,
                "expected_questions": expected,
                "generator": self.port.describe(),
            }),
        );

        if expected < target {
            let documents = state.documents.len();
            warn!(target, expected, documents, "Target is not reachable");
            emitter.warning(
                Phase::Initialized,
                format!(
                    "Requested {} questions; at most {} will be generated from {} documents",
                    target, expected, documents
                ),
                json!({
                    "target_questions": target,
                    "expected_questions": expected,
                    "documents": documents,
                }),
            );
        }

        let ctx = PhaseContext {
            port: self.port.as_ref(),
            emitter,
            limits: &self.limits,
        };

        for phase in Phase::SEQUENCE {
            match run_phase(state, phase, &ctx).await {
                PhaseOutcome::Continue(next) => state = next,
                PhaseOutcome::Failed { state: failed, reason } => {
                    debug!(
                        run_id = %emitter.run_id(),
                        phase = %failed.current_phase,
                        seeds = failed.seed_questions.len(),
                        evolved = failed.evolved_questions.len(),
                        "Discarding partial results"
                    );
                    return Err(fail(emitter, reason));
                }
            }
        }

        state.current_phase = Phase::Completed;
        let result = state.into_result();

        if let Err(err) = verify_lineage(&result) {
            return Err(fail(emitter, err.to_string()));
        }

        let placeholders = result.question_answers.iter().filter(|a| a.placeholder).count();
        info!(
            run_id = %emitter.run_id(),
            total = result.total_questions,
            seeds = result.seed_questions.len(),
            "Evolution pipeline complete"
        );
        emitter.complete(
            format!(
                "Generated {} evolved questions from {} seeds",
                result.total_questions,
                result.seed_questions.len()
            ),
            json!({
                "total_questions": result.total_questions,
                "seed_questions": result.seed_questions.len(),
                "simple": result.count_of(EvolutionType::Simple),
                "multi_context": result.count_of(EvolutionType::MultiContext),
                "reasoning": result.count_of(EvolutionType::Reasoning),
                "answers": result.question_answers.len(),
                "placeholder_answers": placeholders,
                "contexts": result.question_contexts.len(),
            }),
        );

        Ok(result)
    }
}

impl std::fmt::Debug for EvolPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolPipeline")
            .field("generator", &self.port.describe())
            .field("limits", &self.limits)
            .finish()
    }
}

fn fail(emitter: &ProgressEmitter, reason: String) -> EvolError {
    warn!(run_id = %emitter.run_id(), "Pipeline failed: {}", reason);
    emitter.error(
        Phase::Failed,
        format!("Pipeline failed: {}", reason),
        json!({ "fatal": true }),
    );
    EvolError::PipelineFailed(reason)
}

/// Input checks applied before any phase runs.
pub fn validate_input(documents: &[Document], target_questions: usize) -> Result<(), EvolError> {
    if documents.is_empty() {
        return Err(EvolError::NoDocuments);
    }
    if let Some(index) = documents.iter().position(Document::is_blank) {
        return Err(EvolError::BlankDocument { index });
    }
    if !(MIN_TARGET_QUESTIONS..=MAX_TARGET_QUESTIONS).contains(&target_questions) {
        return Err(EvolError::TargetOutOfRange {
            value: target_questions as i64,
            min: MIN_TARGET_QUESTIONS,
            max: MAX_TARGET_QUESTIONS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::QuestionId;
    use crate::phases::testing::ScriptedPort;
    use crate::progress::{progress_channel, ProgressEvent, ProgressEventKind, SinkError};
    use crate::types::SeedQuestion;

    fn loan_documents() -> Vec<Document> {
        vec![
            Document::new("Student loans help pay for college. Federal loans have fixed interest rates."),
            Document::new("Federal student loans include subsidized and unsubsidized loans."),
            Document::new("Eligibility requires a completed FAFSA. Students must be enrolled at least half-time."),
        ]
    }

    fn pipeline(port: Arc<ScriptedPort>) -> EvolPipeline {
        EvolPipeline::new(port, PipelineLimits::default())
    }

    #[tokio::test]
    async fn test_three_documents_target_nine() {
        let port = Arc::new(ScriptedPort::default());
        let result = pipeline(port.clone()).run(loan_documents(), 9, None).await.unwrap();

        assert_eq!(result.seed_questions.len(), 3);
        assert_eq!(result.count_of(EvolutionType::Simple), 3);
        assert_eq!(result.count_of(EvolutionType::MultiContext), 3);
        assert_eq!(result.count_of(EvolutionType::Reasoning), 3);
        assert_eq!(result.total_questions, 9);
        assert_eq!(result.question_answers.len(), 9);
        assert_eq!(result.question_contexts.len(), 9);
        assert!(result
            .evolved_questions
            .iter()
            .filter(|q| q.evolution_type == EvolutionType::MultiContext)
            .all(|q| q.requires_multiple_docs == Some(true)));
        for set in &result.question_contexts {
            assert!((1..=3).contains(&set.contexts.len()));
            assert!(set.contexts.iter().all(|c| !c.is_empty()));
        }
        // 3 seeds + 9 evolutions + 9 answers
        assert_eq!(port.calls(), 21);
    }

    #[tokio::test]
    async fn test_single_document_target_three() {
        let port = Arc::new(ScriptedPort::default());
        let docs = vec![Document::new("Grants do not need to be repaid.")];
        let result = pipeline(port).run(docs, 3, None).await.unwrap();

        assert_eq!(result.seed_questions.len(), 1);
        assert_eq!(result.total_questions, 3);
        let multi: Vec<_> = result
            .evolved_questions
            .iter()
            .filter(|q| q.evolution_type == EvolutionType::MultiContext)
            .collect();
        assert_eq!(multi.len(), 1);
        assert!(!multi[0].needs_multiple_docs());
    }

    #[tokio::test]
    async fn test_all_seed_failures_do_not_fail_run() {
        let port = Arc::new(ScriptedPort {
            fail_all: true,
            ..Default::default()
        });
        let result = pipeline(port.clone()).run(loan_documents(), 9, None).await.unwrap();

        assert!(result.seed_questions.is_empty());
        assert_eq!(result.total_questions, 0);
        assert_eq!(port.calls(), 3);
    }

    #[tokio::test]
    async fn test_lineage_holds_with_partial_failures() {
        let port = Arc::new(ScriptedPort::failing_calls([1, 4, 9]));
        let result = pipeline(port).run(loan_documents(), 9, None).await.unwrap();

        verify_lineage(&result).unwrap();
        assert_eq!(result.question_answers.len(), result.total_questions);
        assert_eq!(result.question_contexts.len(), result.total_questions);
        for q in &result.evolved_questions {
            assert!(result.seed_questions.iter().any(|s| s.id == q.source_question_id));
        }
    }

    #[tokio::test]
    async fn test_input_validation_runs_before_phases() {
        let port = Arc::new(ScriptedPort::default());
        let p = pipeline(port.clone());

        assert!(matches!(p.run(vec![], 9, None).await, Err(EvolError::NoDocuments)));
        assert!(matches!(
            p.run(vec![Document::new("ok"), Document::new("  ")], 9, None).await,
            Err(EvolError::BlankDocument { index: 1 })
        ));
        assert!(matches!(
            p.run(loan_documents(), 2, None).await,
            Err(EvolError::TargetOutOfRange { value: 2, .. })
        ));
        assert!(matches!(
            p.run(loan_documents(), 16, None).await,
            Err(EvolError::TargetOutOfRange { .. })
        ));
        assert_eq!(port.calls(), 0);
    }

    #[tokio::test]
    async fn test_phase_failure_short_circuits() {
        let port = Arc::new(ScriptedPort::default());
        let p = pipeline(port.clone());
        let (sink, mut receiver) = progress_channel();
        let emitter = ProgressEmitter::new(Some(Arc::new(sink)));

        let mut state = PipelineState::new(loan_documents(), 9);
        state.seed_questions.push(SeedQuestion {
            id: QuestionId::from("seed_orphan"),
            question: "orphan".to_string(),
            source_doc_index: 9,
            metadata: Default::default(),
        });

        let err = p.drive(state, &emitter).await.unwrap_err();
        assert!(matches!(err, EvolError::PipelineFailed(_)));
        assert!(err.to_string().starts_with("Pipeline error: simple_evolution"));
        // Only seed generation reached the port.
        assert_eq!(port.calls(), 3);

        drop(emitter);
        let events = receiver.drain();
        let last = events.last().unwrap();
        assert_eq!(last.kind, ProgressEventKind::Error);
        assert_eq!(last.phase, "failed");
        assert!(!events.iter().any(|e| e.phase == "multi_context_evolution"));
        assert!(!events.iter().any(|e| e.kind == ProgressEventKind::Complete));
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let port = Arc::new(ScriptedPort::default());
        let (sink, mut receiver) = progress_channel();
        pipeline(port)
            .run(loan_documents(), 3, Some(Arc::new(sink)))
            .await
            .unwrap();

        let events = receiver.drain();
        assert_eq!(events.first().unwrap().kind, ProgressEventKind::Start);
        assert_eq!(events.last().unwrap().kind, ProgressEventKind::Complete);
        assert_eq!(events.last().unwrap().details["total_questions"], 3);

        let phase_starts: Vec<_> = events
            .iter()
            .filter(|e| e.kind == ProgressEventKind::PhaseStart)
            .map(|e| e.phase.as_str())
            .collect();
        assert_eq!(
            phase_starts,
            [
                "seed_generation",
                "simple_evolution",
                "multi_context_evolution",
                "reasoning_evolution",
                "generate_answers",
                "extract_contexts"
            ]
        );

        let run_id = &events[0].details["run_id"];
        assert!(events.iter().all(|e| &e.details["run_id"] == run_id));
    }

    #[tokio::test]
    async fn test_shortfall_warning() {
        let port = Arc::new(ScriptedPort::default());
        let (sink, mut receiver) = progress_channel();
        let result = pipeline(port)
            .run(loan_documents(), 10, Some(Arc::new(sink)))
            .await
            .unwrap();
        assert_eq!(result.total_questions, 9);
        assert_eq!(result.target_questions, 10);

        let events = receiver.drain();
        let warning = events
            .iter()
            .find(|e| e.kind == ProgressEventKind::Warning && e.phase == "initialized")
            .unwrap();
        assert_eq!(warning.details["expected_questions"], 9);
    }

    #[tokio::test]
    async fn test_single_document_shortfall_warning() {
        let port = Arc::new(ScriptedPort::default());
        let (sink, mut receiver) = progress_channel();
        let docs = vec![Document::new("Grants do not need to be repaid.")];
        let result = pipeline(port)
            .run(docs, 9, Some(Arc::new(sink)))
            .await
            .unwrap();
        assert_eq!(result.total_questions, 3);

        let events = receiver.drain();
        let warning = events
            .iter()
            .find(|e| e.kind == ProgressEventKind::Warning && e.phase == "initialized")
            .unwrap();
        assert_eq!(warning.details["expected_questions"], 3);
        assert_eq!(warning.details["documents"], 1);
        assert_eq!(events[0].details["expected_questions"], 3);
    }

    #[tokio::test]
    async fn test_no_shortfall_warning_when_reachable() {
        let (sink, mut receiver) = progress_channel();
        pipeline(Arc::new(ScriptedPort::default()))
            .run(loan_documents(), 9, Some(Arc::new(sink)))
            .await
            .unwrap();
        assert!(!receiver
            .drain()
            .iter()
            .any(|e| e.kind == ProgressEventKind::Warning));
    }

    #[tokio::test]
    async fn test_item_failures_are_non_fatal_errors() {
        // Call 1 is the second seed, 4 the second simple evolution, 9 the first answer.
        let port = Arc::new(ScriptedPort::failing_calls([1, 4, 9]));
        let (sink, mut receiver) = progress_channel();
        let result = pipeline(port)
            .run(loan_documents(), 9, Some(Arc::new(sink)))
            .await
            .unwrap();
        assert_eq!(result.seed_questions.len(), 2);

        let events = receiver.drain();
        let errors: Vec<_> = events
            .iter()
            .filter(|e| e.kind == ProgressEventKind::Error)
            .collect();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.detail("fatal").is_none()));
        assert_eq!(errors[0].phase, "seed_generation");
        assert_eq!(errors[1].phase, "simple_evolution");
        assert_eq!(errors[2].phase, "generate_answers");
        assert_eq!(errors[2].details["placeholder"], true);
        assert_eq!(events.last().unwrap().kind, ProgressEventKind::Complete);
    }

    struct RejectingSink;

    impl ProgressSink for RejectingSink {
        fn emit(&self, _event: ProgressEvent) -> Result<(), SinkError> {
            Err(SinkError::Failed("display went away".to_string()))
        }
    }

    struct PanickingSink;

    impl ProgressSink for PanickingSink {
        fn emit(&self, _event: ProgressEvent) -> Result<(), SinkError> {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_broken_sinks_do_not_change_results() {
        let baseline = pipeline(Arc::new(ScriptedPort::failing_calls([4])))
            .run(loan_documents(), 9, None)
            .await
            .unwrap();

        let rejecting: Arc<dyn ProgressSink> = Arc::new(RejectingSink);
        let panicking: Arc<dyn ProgressSink> = Arc::new(PanickingSink);

        for sink in [rejecting, panicking] {
            let result = pipeline(Arc::new(ScriptedPort::failing_calls([4])))
                .run(loan_documents(), 9, Some(sink))
                .await
                .unwrap();
            assert_eq!(result, baseline);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_runs_keep_events_apart() {
        let shared = pipeline(Arc::new(ScriptedPort::default()));
        let (sink_a, mut receiver_a) = progress_channel();
        let (sink_b, mut receiver_b) = progress_channel();

        let first = {
            let p = shared.clone();
            tokio::spawn(async move { p.run(loan_documents(), 9, Some(Arc::new(sink_a))).await })
        };
        let second = {
            let p = shared.clone();
            tokio::spawn(async move { p.run(loan_documents(), 6, Some(Arc::new(sink_b))).await })
        };
        assert_eq!(first.await.unwrap().unwrap().total_questions, 9);
        assert_eq!(second.await.unwrap().unwrap().total_questions, 6);

        let events_a = receiver_a.drain();
        let events_b = receiver_b.drain();
        let run_a = events_a[0].details["run_id"].clone();
        let run_b = events_b[0].details["run_id"].clone();
        assert_ne!(run_a, run_b);
        assert!(events_a.iter().all(|e| e.details["run_id"] == run_a));
        assert!(events_b.iter().all(|e| e.details["run_id"] == run_b));
        assert_eq!(events_a.last().unwrap().details["total_questions"], 9);
        assert_eq!(events_b.last().unwrap().details["total_questions"], 6);
    }

    #[tokio::test]
    async fn test_placeholder_answers_keep_run_successful() {
        let port = Arc::new(ScriptedPort::failing_on("Answer the following question"));
        let result = pipeline(port).run(loan_documents(), 6, None).await.unwrap();
        assert_eq!(result.question_answers.len(), 6);
        assert!(result.question_answers.iter().all(|a| a.placeholder));
    }
}
