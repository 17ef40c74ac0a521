//! Question IDs and lineage checks.
//!
//! IDs have the form `<prefix>_<index>` (`seed_0`, `simple_2`,
//! `multi_context_1`, `reasoning_0`). The index is the position of the
//! source item in the slice the phase consumed, so an ID stays put even when
//! a sibling call fails. IDs are unique within one run only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::EvolError;
use crate::types::{EvolutionType, EvolvedQuestion, PipelineResult, SeedQuestion};

/// Prefix for seed question IDs.
pub const SEED_PREFIX: &str = "seed";

// ============================================================================
// QuestionId
// ============================================================================

/// Run-local identifier of a seed or evolved question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// ID of the seed generated from the `index`-th selected document.
    pub fn seed(index: usize) -> Self {
        Self(format!("{}_{}", SEED_PREFIX, index))
    }

    /// ID of the question evolved from the `index`-th consumed seed.
    pub fn evolved(kind: EvolutionType, index: usize) -> Self {
        Self(format!("{}_{}", kind.id_prefix(), index))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<prefix>` part, e.g. `multi_context` for `multi_context_1`.
    pub fn prefix(&self) -> &str {
        self.0.rsplit_once('_').map(|(p, _)| p).unwrap_or(&self.0)
    }

    /// Whether this ID names a seed question.
    pub fn is_seed(&self) -> bool {
        self.prefix() == SEED_PREFIX
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// State checks used by the phases
// ============================================================================

/// Every seed must point at a document that exists.
pub fn verify_seed_indices(seeds: &[SeedQuestion], document_count: usize) -> Result<(), EvolError> {
    for seed in seeds {
        if seed.source_doc_index >= document_count {
            return Err(EvolError::InvalidState(format!(
                "seed {} references document {} but only {} documents exist",
                seed.id, seed.source_doc_index, document_count
            )));
        }
    }
    Ok(())
}

/// Every evolved question must descend from a seed of the same run.
pub fn verify_seed_references(
    seeds: &[SeedQuestion],
    evolved: &[EvolvedQuestion],
) -> Result<(), EvolError> {
    let seed_ids: HashSet<&QuestionId> = seeds.iter().map(|s| &s.id).collect();
    for question in evolved {
        if !seed_ids.contains(&question.source_question_id) {
            return Err(EvolError::InvalidState(format!(
                "{} question {} references unknown seed {}",
                question.evolution_type, question.id, question.source_question_id
            )));
        }
    }
    Ok(())
}

/// Full referential check over a finished run.
///
/// - seed and evolved IDs are unique
/// - seed IDs carry the `seed` prefix, evolved IDs the prefix of their type
/// - every evolved question references a seed
/// - every answer and context set references an evolved question
pub fn verify_lineage(result: &PipelineResult) -> Result<(), EvolError> {
    let mut seen = HashSet::new();
    for id in result
        .seed_questions
        .iter()
        .map(|s| &s.id)
        .chain(result.evolved_questions.iter().map(|q| &q.id))
    {
        if !seen.insert(id) {
            return Err(EvolError::InvalidState(format!("duplicate question id {}", id)));
        }
    }

    if let Some(seed) = result.seed_questions.iter().find(|s| !s.id.is_seed()) {
        return Err(EvolError::InvalidState(format!(
            "seed question has non-seed id {}",
            seed.id
        )));
    }
    for question in &result.evolved_questions {
        if question.id.prefix() != question.evolution_type.id_prefix() {
            return Err(EvolError::InvalidState(format!(
                "{} question has mismatched id {}",
                question.evolution_type, question.id
            )));
        }
    }

    verify_seed_references(&result.seed_questions, &result.evolved_questions)?;

    let evolved_ids: HashSet<&QuestionId> =
        result.evolved_questions.iter().map(|q| &q.id).collect();

    for answer in &result.question_answers {
        if !evolved_ids.contains(&answer.question_id) {
            return Err(EvolError::InvalidState(format!(
                "answer references unknown question {}",
                answer.question_id
            )));
        }
    }

    for set in &result.question_contexts {
        if !evolved_ids.contains(&set.question_id) {
            return Err(EvolError::InvalidState(format!(
                "context set references unknown question {}",
                set.question_id
            )));
        }
    }

    Ok(())
}
