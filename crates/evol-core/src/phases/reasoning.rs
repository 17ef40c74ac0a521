//! Reasoning evolution: implication, counterfactual and predictive questions.

use serde_json::json;
use tracing::warn;

use crate::errors::EvolError;
use crate::lineage::{verify_seed_indices, QuestionId};
use crate::phases::PhaseContext;
use crate::prompts::{self, REASONING_PATTERNS};
use crate::state::{Phase, PipelineState};
use crate::text::{excerpt, preview};
use crate::types::{EvolutionType, EvolvedQuestion, Metadata};

const PHASE: Phase = Phase::ReasoningEvolution;

pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    verify_seed_indices(&state.seed_questions, state.documents.len())?;

    let quota = state.evolution_quota();
    let seeds: Vec<_> = state.seed_questions.iter().take(quota).cloned().collect();

    ctx.emitter.phase_start(
        PHASE,
        format!("Creating {} reasoning questions", seeds.len()),
        json!({ "count": seeds.len() }),
    );

    let mut produced = 0;
    for (index, seed) in seeds.iter().enumerate() {
        let pattern = prompts::rotate(REASONING_PATTERNS, index);
        ctx.emitter.step(
            PHASE,
            format!("Creating reasoning question {}/{} ({})", index + 1, seeds.len(), pattern.key),
            json!({ "source_question_id": seed.id, "pattern": pattern.key }),
        );

        let source = &state.documents[seed.source_doc_index].content;
        let prompt = prompts::reasoning_prompt(
            &seed.question,
            excerpt(source, ctx.limits.reasoning_excerpt_chars),
            pattern,
        );

        match ctx.generate_question(&prompt).await {
            Ok(question) => {
                let id = QuestionId::evolved(EvolutionType::Reasoning, index);
                ctx.emitter.success(
                    PHASE,
                    format!("Reasoning evolution {}: {}", index + 1, preview(&question, 60)),
                    json!({ "question_id": id }),
                );
                let mut metadata = Metadata::new();
                metadata.insert("pattern".to_string(), json!(pattern.key));
                state.evolved_questions.push(EvolvedQuestion {
                    id,
                    question,
                    evolution_type: EvolutionType::Reasoning,
                    source_question_id: seed.id.clone(),
                    source_doc_index: Some(seed.source_doc_index),
                    requires_multiple_docs: None,
                    metadata,
                });
                produced += 1;
            }
            Err(err) => {
                warn!(seed = %seed.id, "Reasoning evolution failed: {}", err);
                ctx.emitter.error(
                    PHASE,
                    format!("Failed to create reasoning question from {}: {}", seed.id, err),
                    json!({ "source_question_id": seed.id }),
                );
            }
        }
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Generated {} reasoning questions", produced),
        json!({ "count": produced }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineLimits;
    use crate::phases::testing::ScriptedPort;
    use crate::progress::ProgressEmitter;
    use crate::types::{Document, SeedQuestion};

    #[tokio::test]
    async fn test_reasoning_uses_source_excerpt_and_patterns() {
        let port = ScriptedPort::failing_calls([1]);
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut state = PipelineState::new(
            vec![Document::new("Alpha text."), Document::new("Beta text."), Document::new("Gamma text.")],
            9,
        );
        state.seed_questions = (0..3)
            .map(|i| SeedQuestion {
                id: QuestionId::seed(i),
                question: format!("seed {}", i),
                source_doc_index: i,
                metadata: Default::default(),
            })
            .collect();

        run(&mut state, &ctx).await.unwrap();

        assert!(port.prompt(0).contains("Alpha text."));
        assert!(port.prompt(2).contains("Gamma text."));
        assert!(port.prompt(2).contains("What would happen"));

        let ids: Vec<_> = state.evolved_questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["reasoning_0", "reasoning_2"]);
        assert_eq!(state.evolved_questions[1].metadata["pattern"], "predictive");
        assert_eq!(state.evolved_questions[1].source_doc_index, Some(2));
    }
}
