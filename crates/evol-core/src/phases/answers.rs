//! Answer generation for every evolved question.
//!
//! A failed call yields a placeholder answer flagged `placeholder: true`, so
//! each evolved question ends up with exactly one answer.

use serde_json::json;
use tracing::{debug, warn};

use crate::errors::EvolError;
use crate::lineage::verify_seed_references;
use crate::phases::{candidate_documents, combined_excerpt, PhaseContext};
use crate::prompts;
use crate::state::{Phase, PipelineState};
use crate::text::excerpt;
use crate::types::Answer;

const PHASE: Phase = Phase::GenerateAnswers;

/// Stand-in text for answers that could not be generated.
pub const PLACEHOLDER_ANSWER: &str = "Unable to generate answer due to processing error.";

pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    verify_seed_references(&state.seed_questions, &state.evolved_questions)?;

    let total = state.evolved_questions.len();
    ctx.emitter.phase_start(
        PHASE,
        format!("Generating answers for {} questions", total),
        json!({ "count": total }),
    );

    let mut placeholders = 0;
    for (position, question) in state.evolved_questions.iter().enumerate() {
        ctx.emitter.step(
            PHASE,
            format!("Generating answer {}/{}", position + 1, total),
            json!({ "question_id": question.id }),
        );

        let documents = candidate_documents(&state.documents, question);
        let context = if question.needs_multiple_docs() {
            combined_excerpt(&documents, ctx.limits.answer_excerpt_chars)
        } else {
            documents
                .first()
                .map(|doc| excerpt(&doc.content, ctx.limits.answer_excerpt_chars).to_string())
                .unwrap_or_default()
        };

        let prompt = prompts::answer_prompt(&context, &question.question);
        let (text, placeholder) = match ctx.generate_answer(&prompt).await {
            Ok(answer) => {
                debug!(question = %question.id, chars = answer.len(), "Generated answer");
                ctx.emitter.success(
                    PHASE,
                    format!("Generated answer for {}", question.id),
                    json!({ "question_id": question.id }),
                );
                (answer, false)
            }
            Err(err) => {
                warn!(question = %question.id, "Answer generation failed: {}", err);
                ctx.emitter.error(
                    PHASE,
                    format!("Failed to generate answer for {}: {}", question.id, err),
                    json!({ "question_id": question.id, "placeholder": true }),
                );
                placeholders += 1;
                (PLACEHOLDER_ANSWER.to_string(), true)
            }
        };

        state.answers.push(Answer {
            question_id: question.id.clone(),
            answer: text,
            question_type: question.evolution_type,
            placeholder,
        });
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Generated {} answers", state.answers.len()),
        json!({ "count": state.answers.len(), "placeholders": placeholders }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineLimits;
    use crate::lineage::QuestionId;
    use crate::phases::testing::ScriptedPort;
    use crate::progress::ProgressEmitter;
    use crate::types::{Document, EvolutionType, EvolvedQuestion, SeedQuestion};

    fn state() -> PipelineState {
        let mut state = PipelineState::new(
            vec![Document::new("First doc."), Document::new("Second doc.")],
            6,
        );
        state.seed_questions = vec![SeedQuestion {
            id: QuestionId::seed(0),
            question: "seed".to_string(),
            source_doc_index: 1,
            metadata: Default::default(),
        }];
        state.evolved_questions = vec![
            EvolvedQuestion {
                id: QuestionId::evolved(EvolutionType::Simple, 0),
                question: "simple q".to_string(),
                evolution_type: EvolutionType::Simple,
                source_question_id: QuestionId::seed(0),
                source_doc_index: Some(1),
                requires_multiple_docs: None,
                metadata: Default::default(),
            },
            EvolvedQuestion {
                id: QuestionId::evolved(EvolutionType::MultiContext, 0),
                question: "multi q".to_string(),
                evolution_type: EvolutionType::MultiContext,
                source_question_id: QuestionId::seed(0),
                source_doc_index: None,
                requires_multiple_docs: Some(true),
                metadata: Default::default(),
            },
        ];
        state
    }

    #[tokio::test]
    async fn test_answers_every_question_with_right_context() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut state = state();
        run(&mut state, &ctx).await.unwrap();

        assert_eq!(state.answers.len(), 2);
        assert_eq!(state.answers[1].question_type, EvolutionType::MultiContext);

        let single = port.prompt(0);
        assert!(single.contains("Second doc."));
        assert!(!single.contains("First doc."));

        let multi = port.prompt(1);
        assert!(multi.contains("Document 1:\nFirst doc."));
        assert!(multi.contains("Document 2:\nSecond doc."));
    }

    #[tokio::test]
    async fn test_failed_answer_becomes_placeholder() {
        let port = ScriptedPort::failing_on("multi q");
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut state = state();
        run(&mut state, &ctx).await.unwrap();

        assert_eq!(state.answers.len(), 2);
        assert!(!state.answers[0].placeholder);
        assert_eq!(state.answers[0].answer, "\"reply 0\"");
        assert!(state.answers[1].placeholder);
        assert_eq!(state.answers[1].answer, PLACEHOLDER_ANSWER);
    }

    #[tokio::test]
    async fn test_dangling_seed_reference_is_phase_failure() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut state = state();
        state.seed_questions.clear();
        assert!(run(&mut state, &ctx).await.is_err());
        assert!(state.answers.is_empty());
    }
}
