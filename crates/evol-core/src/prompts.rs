//! Prompt templates and the deterministic strategy tables that rotate them.
//!
//! Each evolution phase picks its variant with `index % table.len()`, where
//! `index` is the seed's position in the phase. No randomness: the same input
//! always yields the same prompts.

// ============================================================================
// Strategy tables
// ============================================================================

/// A named prompt variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Stable key recorded in question metadata.
    pub key: &'static str,
    /// Instruction text inserted into the prompt.
    pub instruction: &'static str,
}

/// Simple-evolution operations.
pub const SIMPLE_OPERATIONS: &[Strategy] = &[
    Strategy {
        key: "add_constraints",
        instruction: "Add specific constraints or conditions to make this question more challenging and detailed.",
    },
    Strategy {
        key: "deepen",
        instruction: "Deepen this question by asking for more comprehensive analysis and explanation.",
    },
    Strategy {
        key: "concretize",
        instruction: "Make this question more concrete by incorporating multiple related aspects or variables.",
    },
    Strategy {
        key: "step_by_step",
        instruction: "Transform this question to require step-by-step reasoning or methodology.",
    },
    Strategy {
        key: "real_world",
        instruction: "Add real-world application context to make this question more practical.",
    },
];

/// Multi-context synthesis framings.
pub const MULTI_CONTEXT_FRAMINGS: &[Strategy] = &[
    Strategy {
        key: "relate",
        instruction: "How do the requirements in one document relate to the processes described in another?",
    },
    Strategy {
        key: "compare",
        instruction: "Compare and contrast the approaches described in two of the documents.",
    },
    Strategy {
        key: "implications",
        instruction: "What are the implications of one document's policies for the scenarios in another?",
    },
];

/// Reasoning patterns.
pub const REASONING_PATTERNS: &[Strategy] = &[
    Strategy {
        key: "implication",
        instruction: "If [condition X] occurs, what would be the implications for [outcome Y], and how should one respond?",
    },
    Strategy {
        key: "counterfactual",
        instruction: "Why might [outcome Y] have turned out differently if [condition X] had not held?",
    },
    Strategy {
        key: "predictive",
        instruction: "What would happen to [stakeholder Y] over time if [action X] were taken, and why?",
    },
];

/// Pick the variant for the `index`-th item of a phase.
pub fn rotate(table: &'static [Strategy], index: usize) -> &'static Strategy {
    &table[index % table.len()]
}

// ============================================================================
// Prompt builders
// ============================================================================

/// Seed question from one document excerpt.
pub fn seed_prompt(excerpt: &str) -> String {
    format!(
        "Based on this document, generate one clear, specific question that can be answered using the information provided.

Document content:
{excerpt}

Requirements:
- Question should be specific and answerable from the document
- Avoid yes/no questions
- Focus on key information or concepts
- Keep it concise but meaningful
- Return only the question

Question:"
    )
}

/// Simple evolution of a seed question.
pub fn simple_prompt(question: &str, strategy: &Strategy) -> String {
    format!(
        "You are an expert at evolving questions to make them more sophisticated and challenging.

Original question: {question}

Task: {instruction}

Requirements:
- The evolved question should still be answerable from the original document context
- Make it more sophisticated but not impossible to answer
- Maintain clarity while adding complexity
- Don't change the core topic, just make it more challenging
- Return only the evolved question

Evolved question:",
        instruction = strategy.instruction
    )
}

/// Cross-document evolution of a seed question.
pub fn multi_context_prompt(question: &str, combined_context: &str, strategy: &Strategy) -> String {
    format!(
        "You are creating questions that require synthesizing information from multiple documents.

Base question: {question}

Available document contexts:
{combined_context}

Create a new question that:
- Requires information from at least 2 different documents
- Asks for comparison, connection, or synthesis across documents
- Is more complex than the original question
- Can still be answered using the provided documents

Use this framing as a guide: \"{framing}\"

Return only the question.

Multi-context question:",
        framing = strategy.instruction
    )
}

/// Single-document fallback for the multi-context phase.
pub fn multi_aspect_prompt(question: &str) -> String {
    format!(
        "Create a more complex question that examines multiple aspects of the topic.

Original question: {question}

Transform this into a question that:
- Examines multiple facets or aspects of the topic
- Requires connecting different concepts within the document
- Is more comprehensive and analytical

Return only the question.

Multi-aspect question:"
    )
}

/// Reasoning evolution grounded in the seed's source excerpt.
pub fn reasoning_prompt(question: &str, excerpt: &str, strategy: &Strategy) -> String {
    format!(
        "Transform this question to require logical reasoning, cause-effect analysis, or inferential thinking.

Original question: {question}

Source excerpt:
{excerpt}

Create a reasoning question that:
- Uses an \"if\", \"why might\", or \"what would happen\" construction
- Asks for cause and effect relationships
- Requires inference beyond direct facts
- Can be reasoned about from the source excerpt

Follow this pattern: \"{pattern}\"

Return only the question.

Reasoning question:",
        pattern = strategy.instruction
    )
}

/// Answer restricted to the supplied context.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the following question based on the provided document context. Be comprehensive, accurate, and well-structured.

Context:
{context}

Question: {question}

Instructions:
- Answer based only on the information provided in the context
- Be thorough and provide detailed explanations
- If the question requires reasoning, show your logical steps
- If the context does not contain enough information, state that clearly
- Structure your answer clearly with appropriate paragraphs

Answer:"
    )
}
