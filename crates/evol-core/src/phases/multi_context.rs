//! Multi-context evolution: questions that span several documents.
//!
//! With fewer than two documents the phase falls back to a single-document
//! "multi-aspect" prompt. Output is still tagged `multi_context`, carries the
//! seed's document index and never claims to need multiple documents.

use serde_json::json;
use tracing::{info, warn};

use crate::config::MAX_COMBINED_DOCUMENTS;
use crate::errors::EvolError;
use crate::lineage::{verify_seed_indices, QuestionId};
use crate::phases::{combined_excerpt, PhaseContext};
use crate::prompts::{self, MULTI_CONTEXT_FRAMINGS};
use crate::state::{Phase, PipelineState};
use crate::text::preview;
use crate::types::{Document, EvolutionType, EvolvedQuestion, Metadata};

const PHASE: Phase = Phase::MultiContextEvolution;

pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    verify_seed_indices(&state.seed_questions, state.documents.len())?;

    let quota = state.evolution_quota();
    let seeds: Vec<_> = state.seed_questions.iter().take(quota).cloned().collect();
    let single_document = state.documents.len() < 2;

    ctx.emitter.phase_start(
        PHASE,
        format!("Creating {} multi-context questions", seeds.len()),
        json!({ "count": seeds.len(), "fallback": single_document }),
    );

    if single_document {
        info!("Only one document available, using multi-aspect evolution");
        ctx.emitter.warning(
            PHASE,
            "Only one document available; generating multi-aspect questions instead",
            json!({ "documents": state.documents.len() }),
        );
    }

    let combined = {
        let docs: Vec<&Document> = state.documents.iter().take(MAX_COMBINED_DOCUMENTS).collect();
        combined_excerpt(&docs, ctx.limits.multi_context_excerpt_chars)
    };
    let document_count = state.documents.len().min(MAX_COMBINED_DOCUMENTS);

    let mut produced = 0;
    for (index, seed) in seeds.iter().enumerate() {
        ctx.emitter.step(
            PHASE,
            format!("Creating multi-context question {}/{}", index + 1, seeds.len()),
            json!({ "source_question_id": seed.id }),
        );

        let mut metadata = Metadata::new();
        let prompt = if single_document {
            metadata.insert("strategy".to_string(), json!("multi_aspect"));
            prompts::multi_aspect_prompt(&seed.question)
        } else {
            let framing = prompts::rotate(MULTI_CONTEXT_FRAMINGS, index);
            metadata.insert("strategy".to_string(), json!("synthesis"));
            metadata.insert("framing".to_string(), json!(framing.key));
            metadata.insert("document_count".to_string(), json!(document_count));
            prompts::multi_context_prompt(&seed.question, &combined, framing)
        };

        match ctx.generate_question(&prompt).await {
            Ok(question) => {
                let id = QuestionId::evolved(EvolutionType::MultiContext, index);
                ctx.emitter.success(
                    PHASE,
                    format!("Multi-context evolution {}: {}", index + 1, preview(&question, 60)),
                    json!({ "question_id": id }),
                );
                let (source_doc_index, requires_multiple_docs) = if single_document {
                    (Some(seed.source_doc_index), None)
                } else {
                    (None, Some(true))
                };
                state.evolved_questions.push(EvolvedQuestion {
                    id,
                    question,
                    evolution_type: EvolutionType::MultiContext,
                    source_question_id: seed.id.clone(),
                    source_doc_index,
                    requires_multiple_docs,
                    metadata,
                });
                produced += 1;
            }
            Err(err) => {
                warn!(seed = %seed.id, "Multi-context evolution failed: {}", err);
                ctx.emitter.error(
                    PHASE,
                    format!("Failed to create multi-context question from {}: {}", seed.id, err),
                    json!({ "source_question_id": seed.id }),
                );
            }
        }
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Generated {} multi-context questions", produced),
        json!({ "count": produced }),
    );
    Ok(())
}
