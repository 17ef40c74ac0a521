//! Context extraction: relevance-scored excerpts for each evolved question.
//!
//! Pure computation over the documents; never calls the generation port and
//! never fails per item.

use serde_json::json;
use tracing::debug;

use crate::errors::EvolError;
use crate::lineage::verify_seed_references;
use crate::phases::{candidate_documents, PhaseContext};
use crate::relevance;
use crate::state::{Phase, PipelineState};
use crate::types::ContextSet;

const PHASE: Phase = Phase::ExtractContexts;

pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    verify_seed_references(&state.seed_questions, &state.evolved_questions)?;

    let total = state.evolved_questions.len();
    ctx.emitter.phase_start(
        PHASE,
        format!("Extracting contexts for {} questions", total),
        json!({ "count": total }),
    );

    for question in &state.evolved_questions {
        let documents: Vec<&str> = candidate_documents(&state.documents, question)
            .into_iter()
            .map(|doc| doc.content.as_str())
            .collect();

        let contexts =
            relevance::select_contexts(&question.question, &documents, ctx.limits.context_fallback_chars);
        if contexts.is_empty() {
            return Err(EvolError::InvalidState(format!(
                "no context available for {}",
                question.id
            )));
        }

        debug!(question = %question.id, contexts = contexts.len(), "Extracted contexts");
        ctx.emitter.step(
            PHASE,
            format!("Extracted {} contexts for {}", contexts.len(), question.id),
            json!({ "question_id": question.id, "contexts": contexts.len() }),
        );

        state.context_sets.push(ContextSet {
            question_id: question.id.clone(),
            contexts,
        });
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Extracted contexts for {} questions", state.context_sets.len()),
        json!({ "count": state.context_sets.len() }),
    );
    Ok(())
}
