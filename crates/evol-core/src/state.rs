//! Pipeline state and the phase state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Answer, ContextSet, Document, EvolvedQuestion, PipelineResult, SeedQuestion};

/// Position of a run in the fixed phase sequence.
///
/// `Initialized -> SeedGeneration -> SimpleEvolution -> MultiContextEvolution
/// -> ReasoningEvolution -> GenerateAnswers -> ExtractContexts -> Completed`,
/// with `Failed` reachable from any working phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialized,
    SeedGeneration,
    SimpleEvolution,
    MultiContextEvolution,
    ReasoningEvolution,
    GenerateAnswers,
    ExtractContexts,
    Completed,
    Failed,
}

impl Phase {
    /// The six working phases in execution order.
    pub const SEQUENCE: [Phase; 6] = [
        Self::SeedGeneration,
        Self::SimpleEvolution,
        Self::MultiContextEvolution,
        Self::ReasoningEvolution,
        Self::GenerateAnswers,
        Self::ExtractContexts,
    ];

    /// Wire name used in progress events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::SeedGeneration => "seed_generation",
            Self::SimpleEvolution => "simple_evolution",
            Self::MultiContextEvolution => "multi_context_evolution",
            Self::ReasoningEvolution => "reasoning_evolution",
            Self::GenerateAnswers => "generate_answers",
            Self::ExtractContexts => "extract_contexts",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single mutable object threaded through all phases of one run.
///
/// Built by the orchestrator, extended in place by each phase, and consumed
/// into a [`PipelineResult`] at the end. Never shared between runs.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub documents: Vec<Document>,
    pub seed_questions: Vec<SeedQuestion>,
    pub evolved_questions: Vec<EvolvedQuestion>,
    pub answers: Vec<Answer>,
    pub context_sets: Vec<ContextSet>,
    pub current_phase: Phase,
    /// Last recorded phase-level failure.
    pub error: Option<String>,
    pub target_questions: usize,
}

impl PipelineState {
    /// Fresh state with empty collections.
    pub fn new(documents: Vec<Document>, target_questions: usize) -> Self {
        Self {
            documents,
            seed_questions: Vec::new(),
            evolved_questions: Vec::new(),
            answers: Vec::new(),
            context_sets: Vec::new(),
            current_phase: Phase::Initialized,
            error: None,
            target_questions,
        }
    }

    /// Seeds to generate: `min(3, target / 3)`.
    pub fn seed_quota(&self) -> usize {
        seed_quota(self.target_questions)
    }

    /// Questions per evolution phase: `target / 3`.
    pub fn evolution_quota(&self) -> usize {
        evolution_quota(self.target_questions)
    }

    /// Extract the caller-facing result.
    pub fn into_result(self) -> PipelineResult {
        PipelineResult {
            total_questions: self.evolved_questions.len(),
            target_questions: self.target_questions,
            evolved_questions: self.evolved_questions,
            question_answers: self.answers,
            question_contexts: self.context_sets,
            seed_questions: self.seed_questions,
        }
    }
}

/// Seeds generated for a target: `min(3, target / 3)`.
pub fn seed_quota(target_questions: usize) -> usize {
    (target_questions / 3).min(3)
}

/// Questions per evolution phase for a target: `target / 3`.
pub fn evolution_quota(target_questions: usize) -> usize {
    target_questions / 3
}

/// Upper bound on evolved questions a run can yield.
///
/// Seed generation uses one document per seed, and each evolution phase
/// consumes at most one seed per question, so the per-phase output is
/// `min(seed_quota, documents, target / 3)`.
pub fn expected_questions(target_questions: usize, document_count: usize) -> usize {
    3 * seed_quota(target_questions)
        .min(document_count)
        .min(evolution_quota(target_questions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotas() {
        assert_eq!(seed_quota(3), 1);
        assert_eq!(seed_quota(9), 3);
        assert_eq!(seed_quota(15), 3);
        assert_eq!(evolution_quota(10), 3);
        assert_eq!(evolution_quota(15), 5);
    }

    #[test]
    fn test_expected_questions() {
        assert_eq!(expected_questions(3, 3), 3);
        assert_eq!(expected_questions(9, 3), 9);
        assert_eq!(expected_questions(10, 3), 9);
        assert_eq!(expected_questions(4, 3), 3);
        assert_eq!(expected_questions(15, 5), 9);
    }

    #[test]
    fn test_expected_questions_capped_by_documents() {
        assert_eq!(expected_questions(9, 1), 3);
        assert_eq!(expected_questions(9, 2), 6);
        assert_eq!(expected_questions(3, 1), 3);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::MultiContextEvolution.as_str(), "multi_context_evolution");
        assert_eq!(
            serde_json::to_string(&Phase::GenerateAnswers).unwrap(),
            "\"generate_answers\""
        );
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::ExtractContexts.is_terminal());
    }

    #[test]
    fn test_into_result_counts_evolved() {
        let state = PipelineState::new(vec![Document::new("text")], 6);
        let result = state.into_result();
        assert_eq!(result.total_questions, 0);
        assert_eq!(result.target_questions, 6);
    }
}
