//! The six pipeline phases.
//!
//! Each phase is an async function over `&mut PipelineState`. An `Err` is a
//! phase-level failure (the state is inconsistent); per-item generation
//! failures are handled inside the phase and never surface here.
//!
//! | Phase | Module |
//! |-------|--------|
//! | seed generation | [`seed`] |
//! | simple evolution | [`simple`] |
//! | multi-context evolution | [`multi_context`] |
//! | reasoning evolution | [`reasoning`] |
//! | answer generation | [`answers`] |
//! | context extraction | [`contexts`] |

pub mod answers;
pub mod contexts;
pub mod multi_context;
pub mod reasoning;
pub mod seed;
pub mod simple;

pub use answers::PLACEHOLDER_ANSWER;

use crate::config::{PipelineLimits, MAX_COMBINED_DOCUMENTS};
use crate::errors::{EvolError, GenerationError};
use crate::generation::GenerationPort;
use crate::progress::ProgressEmitter;
use crate::state::{Phase, PipelineState};
use crate::text::{excerpt, strip_wrapping_quotes};
use crate::types::{Document, EvolvedQuestion};

/// Result of running one phase, as seen by the orchestrator.
#[derive(Debug)]
pub enum PhaseOutcome {
    /// The phase finished; move on.
    Continue(PipelineState),
    /// The phase hit a state-level failure; stop.
    Failed {
        state: PipelineState,
        reason: String,
    },
}

/// Collaborators shared by every phase of a run.
pub struct PhaseContext<'a> {
    pub port: &'a dyn GenerationPort,
    pub emitter: &'a ProgressEmitter,
    pub limits: &'a PipelineLimits,
}

impl PhaseContext<'_> {
    /// One generation call for a question: quotes stripped, empty rejected.
    pub async fn generate_question(&self, prompt: &str) -> Result<String, GenerationError> {
        let raw = self.port.generate(prompt).await?;
        let question = strip_wrapping_quotes(&raw);
        if question.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(question)
    }

    /// One generation call for an answer: trimmed, empty rejected.
    pub async fn generate_answer(&self, prompt: &str) -> Result<String, GenerationError> {
        let raw = self.port.generate(prompt).await?;
        let answer = raw.trim();
        if answer.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(answer.to_string())
    }
}

/// Run one phase and record failure on the state.
///
/// A state that already failed passes through untouched: no generation
/// calls, no events. On failure the state moves to [`Phase::Failed`].
pub async fn run_phase(mut state: PipelineState, phase: Phase, ctx: &PhaseContext<'_>) -> PhaseOutcome {
    if state.current_phase.is_terminal() || state.error.is_some() {
        let reason = state
            .error
            .clone()
            .unwrap_or_else(|| format!("run already {}", state.current_phase));
        return PhaseOutcome::Failed { state, reason };
    }
    state.current_phase = phase;

    let result = match phase {
        Phase::SeedGeneration => seed::run(&mut state, ctx).await,
        Phase::SimpleEvolution => simple::run(&mut state, ctx).await,
        Phase::MultiContextEvolution => multi_context::run(&mut state, ctx).await,
        Phase::ReasoningEvolution => reasoning::run(&mut state, ctx).await,
        Phase::GenerateAnswers => answers::run(&mut state, ctx).await,
        Phase::ExtractContexts => contexts::run(&mut state, ctx).await,
        other => Err(EvolError::InvalidState(format!("{} is not a runnable phase", other))),
    };

    match result {
        Ok(()) => PhaseOutcome::Continue(state),
        Err(err) => {
            let reason = format!("{}: {}", phase, err);
            tracing::error!(phase = %phase, "Phase failed: {}", err);
            ctx.emitter.error(
                phase,
                format!("Phase {} failed: {}", phase, err),
                serde_json::json!({ "fatal": true }),
            );
            state.error = Some(reason.clone());
            state.current_phase = Phase::Failed;
            PhaseOutcome::Failed { state, reason }
        }
    }
}

/// Documents a question draws on.
///
/// Multi-document questions use the first [`MAX_COMBINED_DOCUMENTS`];
/// others use their source document, falling back to document 0 when the
/// index is missing or out of range.
pub fn candidate_documents<'a>(documents: &'a [Document], question: &EvolvedQuestion) -> Vec<&'a Document> {
    if question.needs_multiple_docs() {
        return documents.iter().take(MAX_COMBINED_DOCUMENTS).collect();
    }
    let index = question
        .source_doc_index
        .filter(|i| *i < documents.len())
        .unwrap_or(0);
    documents.get(index).into_iter().collect()
}

/// `Document N:` labelled excerpts joined by blank lines.
pub fn combined_excerpt(documents: &[&Document], max_chars: usize) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("Document {}:\n{}", i + 1, excerpt(&doc.content, max_chars)))
        .collect::<Vec<_>>()
        .join("\n\n")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::QuestionId;
    use crate::phases::testing::ScriptedPort;
    use crate::types::{EvolutionType, SeedQuestion};

    fn question(source: Option<usize>, multi: Option<bool>) -> EvolvedQuestion {
        EvolvedQuestion {
            id: QuestionId::evolved(EvolutionType::Simple, 0),
            question: "q".to_string(),
            evolution_type: EvolutionType::Simple,
            source_question_id: QuestionId::seed(0),
            source_doc_index: source,
            requires_multiple_docs: multi,
            metadata: Default::default(),
        }
    }

    fn docs(n: usize) -> Vec<Document> {
        (0..n).map(|i| Document::new(format!("doc {}", i))).collect()
    }

    fn orphan_state() -> PipelineState {
        let mut state = PipelineState::new(docs(2), 6);
        state.seed_questions.push(SeedQuestion {
            id: QuestionId::seed(0),
            question: "orphan".to_string(),
            source_doc_index: 5,
            metadata: Default::default(),
        });
        state
    }

    #[tokio::test]
    async fn test_failed_phase_marks_state_failed() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext {
            port: &port,
            emitter: &emitter,
            limits: &limits,
        };

        let state = match run_phase(orphan_state(), Phase::SimpleEvolution, &ctx).await {
            PhaseOutcome::Failed { state, reason } => {
                assert!(reason.starts_with("simple_evolution"));
                state
            }
            PhaseOutcome::Continue(_) => panic!("inconsistent state was accepted"),
        };
        assert_eq!(state.current_phase, Phase::Failed);
        assert!(state.current_phase.is_terminal());
        assert!(state.error.is_some());

        // A failed state skips every later phase.
        match run_phase(state, Phase::MultiContextEvolution, &ctx).await {
            PhaseOutcome::Failed { state, .. } => assert_eq!(state.current_phase, Phase::Failed),
            PhaseOutcome::Continue(_) => panic!("failed state was resumed"),
        }
        assert_eq!(port.calls(), 0);
    }

    #[tokio::test]
    async fn test_completed_state_is_not_rerun() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext {
            port: &port,
            emitter: &emitter,
            limits: &limits,
        };
        let mut state = PipelineState::new(docs(1), 3);
        state.current_phase = Phase::Completed;

        match run_phase(state, Phase::SeedGeneration, &ctx).await {
            PhaseOutcome::Failed { reason, .. } => assert_eq!(reason, "run already completed"),
            PhaseOutcome::Continue(_) => panic!("completed state was rerun"),
        }
        assert_eq!(port.calls(), 0);
    }

    #[test]
    fn test_candidate_documents_single() {
        let documents = docs(3);
        let picked = candidate_documents(&documents, &question(Some(2), None));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].content, "doc 2");
    }

    #[test]
    fn test_candidate_documents_out_of_range_falls_back() {
        let documents = docs(2);
        let picked = candidate_documents(&documents, &question(Some(7), None));
        assert_eq!(picked[0].content, "doc 0");
    }

    #[test]
    fn test_candidate_documents_multi_caps_at_three() {
        let documents = docs(5);
        let picked = candidate_documents(&documents, &question(None, Some(true)));
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_combined_excerpt_labels_documents() {
        let documents = docs(2);
        let refs: Vec<&Document> = documents.iter().collect();
        assert_eq!(
            combined_excerpt(&refs, 3),
            "Document 1:\ndoc\n\nDocument 2:\ndoc"
        );
    }
}
