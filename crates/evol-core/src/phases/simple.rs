//! Simple evolution: constraints, depth, concreteness.

use serde_json::json;
use tracing::warn;

use crate::errors::EvolError;
use crate::lineage::{verify_seed_indices, QuestionId};
use crate::phases::PhaseContext;
use crate::prompts::{self, SIMPLE_OPERATIONS};
use crate::state::{Phase, PipelineState};
use crate::text::preview;
use crate::types::{EvolutionType, EvolvedQuestion, Metadata};

const PHASE: Phase = Phase::SimpleEvolution;

pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    verify_seed_indices(&state.seed_questions, state.documents.len())?;

    let quota = state.evolution_quota();
    let seeds: Vec<_> = state.seed_questions.iter().take(quota).cloned().collect();

    ctx.emitter.phase_start(
        PHASE,
        format!("Applying simple evolution to {} questions", seeds.len()),
        json!({ "count": seeds.len() }),
    );

    let mut produced = 0;
    for (index, seed) in seeds.iter().enumerate() {
        let operation = prompts::rotate(SIMPLE_OPERATIONS, index);
        ctx.emitter.step(
            PHASE,
            format!("Evolving question {}/{} ({})", index + 1, seeds.len(), operation.key),
            json!({ "source_question_id": seed.id, "operation": operation.key }),
        );

        let prompt = prompts::simple_prompt(&seed.question, operation);
        match ctx.generate_question(&prompt).await {
            Ok(question) => {
                let id = QuestionId::evolved(EvolutionType::Simple, index);
                ctx.emitter.success(
                    PHASE,
                    format!("Simple evolution {}: {}", index + 1, preview(&question, 60)),
                    json!({ "question_id": id }),
                );
                let mut metadata = Metadata::new();
                metadata.insert("operation".to_string(), json!(operation.key));
                state.evolved_questions.push(EvolvedQuestion {
                    id,
                    question,
                    evolution_type: EvolutionType::Simple,
                    source_question_id: seed.id.clone(),
                    source_doc_index: Some(seed.source_doc_index),
                    requires_multiple_docs: None,
                    metadata,
                });
                produced += 1;
            }
            Err(err) => {
                warn!(seed = %seed.id, "Simple evolution failed: {}", err);
                ctx.emitter.error(
                    PHASE,
                    format!("Failed to evolve {}: {}", seed.id, err),
                    json!({ "source_question_id": seed.id }),
                );
            }
        }
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Generated {} simple evolution questions", produced),
        json!({ "count": produced }),
    );
    Ok(())
}
