//! Seed generation: one question per selected document.

use serde_json::json;
use tracing::{debug, warn};

use crate::errors::EvolError;
use crate::lineage::QuestionId;
use crate::phases::PhaseContext;
use crate::prompts;
use crate::state::{Phase, PipelineState};
use crate::text::{excerpt, preview};
use crate::types::SeedQuestion;

const PHASE: Phase = Phase::SeedGeneration;

/// Generate up to `min(3, target / 3)` seeds from the leading documents.
pub async fn run(state: &mut PipelineState, ctx: &PhaseContext<'_>) -> Result<(), EvolError> {
    let quota = state.seed_quota().min(state.documents.len());

    ctx.emitter.phase_start(
        PHASE,
        format!("Generating {} seed questions", quota),
        json!({ "count": quota, "documents": state.documents.len() }),
    );

    for index in 0..quota {
        let document = &state.documents[index];
        ctx.emitter.step(
            PHASE,
            format!("Generating seed question {}/{}", index + 1, quota),
            json!({ "document_index": index }),
        );

        let prompt = prompts::seed_prompt(excerpt(&document.content, ctx.limits.seed_excerpt_chars));
        match ctx.generate_question(&prompt).await {
            Ok(question) => {
                let id = QuestionId::seed(index);
                debug!(id = %id, "Seed question: {}", preview(&question, 60));
                ctx.emitter.success(
                    PHASE,
                    format!("Seed question {}: {}", index + 1, preview(&question, 60)),
                    json!({ "question_id": id, "document_index": index }),
                );
                state.seed_questions.push(SeedQuestion {
                    id,
                    question,
                    source_doc_index: index,
                    metadata: document.metadata.clone(),
                });
            }
            Err(err) => {
                warn!(document_index = index, "Seed generation failed: {}", err);
                ctx.emitter.error(
                    PHASE,
                    format!("Failed to generate seed question {}: {}", index + 1, err),
                    json!({ "document_index": index }),
                );
            }
        }
    }

    ctx.emitter.phase_complete(
        PHASE,
        format!("Generated {} seed questions", state.seed_questions.len()),
        json!({ "count": state.seed_questions.len() }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineLimits;
    use crate::phases::testing::ScriptedPort;
    use crate::progress::ProgressEmitter;
    use crate::types::Document;

    fn state(docs: usize, target: usize) -> PipelineState {
        let documents = (0..docs)
            .map(|i| Document::new(format!("Document body {}.", i)).with_metadata("source", format!("d{}.pdf", i)))
            .collect();
        PipelineState::new(documents, target)
    }

    #[tokio::test]
    async fn test_seeds_capped_by_quota_and_documents() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut s = state(5, 9);
        run(&mut s, &ctx).await.unwrap();
        assert_eq!(s.seed_questions.len(), 3);
        assert_eq!(s.seed_questions[0].question, "reply 0");
        assert_eq!(s.seed_questions[2].source_doc_index, 2);
        assert_eq!(s.seed_questions[1].metadata["source"], "d1.pdf");

        let mut s = state(2, 15);
        let port = ScriptedPort::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };
        run(&mut s, &ctx).await.unwrap();
        assert_eq!(s.seed_questions.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_document_is_skipped_and_ids_stay_positional() {
        let port = ScriptedPort::failing_calls([1]);
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits::default();
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut s = state(3, 9);
        run(&mut s, &ctx).await.unwrap();
        let ids: Vec<_> = s.seed_questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["seed_0", "seed_2"]);
        assert_eq!(port.calls(), 3);
    }

    #[tokio::test]
    async fn test_prompt_uses_truncated_excerpt() {
        let port = ScriptedPort::default();
        let emitter = ProgressEmitter::disabled();
        let limits = PipelineLimits {
            seed_excerpt_chars: 8,
            ..Default::default()
        };
        let ctx = PhaseContext { port: &port, emitter: &emitter, limits: &limits };

        let mut s = state(1, 3);
        run(&mut s, &ctx).await.unwrap();
        let prompt = port.prompt(0);
        assert!(prompt.contains("Document\n"));
        assert!(!prompt.contains("body"));
    }
}
