//! Domain types for the Evol pipeline.
//!
//! These are the artifacts the pipeline produces and the documents it reads.
//! Field names follow the JSON shape consumers already expect
//! (`evolved_questions`, `question_answers`, `question_contexts`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lineage::QuestionId;

/// Free-form metadata attached to documents and questions.
pub type Metadata = Map<String, Value>;

// ============================================================================
// Document
// ============================================================================

/// An input document. Owned by the caller and never modified by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text content. Also accepted as `page_content`.
    #[serde(alias = "page_content")]
    pub content: String,

    /// Arbitrary metadata (source file, page, section).
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the content is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ============================================================================
// EvolutionType
// ============================================================================

/// The transformation applied to a seed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionType {
    /// Constraints, deeper analysis, more concrete framing.
    Simple,
    /// Synthesis across two or more documents.
    MultiContext,
    /// Implication, counterfactual or predictive reasoning.
    Reasoning,
}

impl EvolutionType {
    /// All evolution types in pipeline order.
    pub const ALL: [EvolutionType; 3] = [Self::Simple, Self::MultiContext, Self::Reasoning];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::MultiContext => "multi_context",
            Self::Reasoning => "reasoning",
        }
    }

    /// Prefix of the IDs this evolution produces.
    pub fn id_prefix(&self) -> &'static str {
        self.as_str()
    }

    /// Human-readable description and sample operations.
    pub fn info(&self) -> EvolutionTypeInfo {
        match self {
            Self::Simple => EvolutionTypeInfo {
                name: *self,
                description: "Basic evolutions that add constraints, deepen analysis, or increase complexity",
                examples: &[
                    "Add specific constraints to make question more challenging",
                    "Transform to require step-by-step reasoning",
                    "Add real-world application context",
                ],
            },
            Self::MultiContext => EvolutionTypeInfo {
                name: *self,
                description: "Questions that require information from multiple documents or sources",
                examples: &[
                    "Compare information across different documents",
                    "Synthesize concepts from multiple sources",
                    "Analyze relationships between different document sections",
                ],
            },
            Self::Reasoning => EvolutionTypeInfo {
                name: *self,
                description: "Questions requiring logical inference, cause-effect analysis, or strategic thinking",
                examples: &[
                    "If-then conditional analysis",
                    "Cause and effect relationships",
                    "Problem-solving scenarios",
                ],
            },
        }
    }
}

impl std::fmt::Display for EvolutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvolutionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "simple" => Ok(Self::Simple),
            "multi_context" | "multicontext" => Ok(Self::MultiContext),
            "reasoning" => Ok(Self::Reasoning),
            _ => Err(format!(
                "Unknown evolution type: '{}'. Use 'simple', 'multi_context', or 'reasoning'.",
                s
            )),
        }
    }
}

/// Descriptor for an evolution type, shown by `evol types`.
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionTypeInfo {
    /// The evolution type.
    pub name: EvolutionType,
    /// One-line description.
    pub description: &'static str,
    /// Sample operations.
    pub examples: &'static [&'static str],
}

// ============================================================================
// Questions, answers, contexts
// ============================================================================

/// First-generation question derived directly from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedQuestion {
    /// `seed_<n>`.
    pub id: QuestionId,
    /// Question text.
    pub question: String,
    /// Position of the source document.
    pub source_doc_index: usize,
    /// Metadata copied from the source document.
    #[serde(default)]
    pub metadata: Metadata,
}

/// A question produced by one of the three evolution phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolvedQuestion {
    /// `<evolution_type>_<n>`.
    pub id: QuestionId,
    /// Question text.
    pub question: String,
    /// Which evolution produced it.
    pub evolution_type: EvolutionType,
    /// The seed it was evolved from.
    pub source_question_id: QuestionId,
    /// Source document, absent for cross-document questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_doc_index: Option<usize>,
    /// Set for questions that need several documents to answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_multiple_docs: Option<bool>,
    /// Strategy details (template variant, fallback path).
    #[serde(default)]
    pub metadata: Metadata,
}

impl EvolvedQuestion {
    /// Whether answering needs more than one document.
    pub fn needs_multiple_docs(&self) -> bool {
        self.requires_multiple_docs.unwrap_or(false)
    }
}

/// Generated answer for one evolved question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The evolved question this answers.
    pub question_id: QuestionId,
    /// Answer text.
    pub answer: String,
    /// Copy of the question's evolution type.
    pub question_type: EvolutionType,
    /// True when generation failed and the text is a stand-in.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

/// Supporting excerpts for one evolved question. Holds 1 to 3 non-empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSet {
    /// The evolved question these excerpts support.
    pub question_id: QuestionId,
    /// Ordered excerpts.
    pub contexts: Vec<String>,
}

// ============================================================================
// PipelineResult
// ============================================================================

/// Output of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// All evolved questions, in phase order.
    pub evolved_questions: Vec<EvolvedQuestion>,
    /// One answer per evolved question.
    pub question_answers: Vec<Answer>,
    /// One context set per evolved question.
    pub question_contexts: Vec<ContextSet>,
    /// Seeds the evolutions started from.
    pub seed_questions: Vec<SeedQuestion>,
    /// `evolved_questions.len()`.
    pub total_questions: usize,
    /// The target the run was asked for.
    pub target_questions: usize,
}

impl PipelineResult {
    /// Number of evolved questions of the given type.
    pub fn count_of(&self, kind: EvolutionType) -> usize {
        self.evolved_questions
            .iter()
            .filter(|q| q.evolution_type == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_accepts_page_content_alias() {
        let doc: Document =
            serde_json::from_str(r#"{"page_content": "Loans.", "metadata": {"page": 1}}"#)
                .unwrap();
        assert_eq!(doc.content, "Loans.");
        assert_eq!(doc.metadata["page"], 1);

        let doc: Document = serde_json::from_str(r#"{"content": "Loans."}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn test_document_is_blank() {
        assert!(Document::new("  \n\t").is_blank());
        assert!(!Document::new(" x ").is_blank());
    }

    #[test]
    fn test_evolution_type_serde() {
        assert_eq!(
            serde_json::to_string(&EvolutionType::MultiContext).unwrap(),
            "\"multi_context\""
        );
        assert_eq!(
            "multi-context".parse::<EvolutionType>().unwrap(),
            EvolutionType::MultiContext
        );
        assert!("complex".parse::<EvolutionType>().is_err());
    }

    #[test]
    fn test_evolved_question_omits_absent_fields() {
        let q = EvolvedQuestion {
            id: QuestionId::evolved(EvolutionType::MultiContext, 0),
            question: "How do A and B relate?".to_string(),
            evolution_type: EvolutionType::MultiContext,
            source_question_id: QuestionId::seed(0),
            source_doc_index: None,
            requires_multiple_docs: Some(true),
            metadata: Metadata::new(),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("source_doc_index").is_none());
        assert_eq!(json["requires_multiple_docs"], true);
        assert_eq!(json["id"], "multi_context_0");
        assert!(q.needs_multiple_docs());
    }

    #[test]
    fn test_answer_placeholder_flag_only_serialized_when_set() {
        let mut answer = Answer {
            question_id: QuestionId::from("simple_0"),
            answer: "text".to_string(),
            question_type: EvolutionType::Simple,
            placeholder: false,
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert!(json.get("placeholder").is_none());

        answer.placeholder = true;
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["placeholder"], true);
    }
}
