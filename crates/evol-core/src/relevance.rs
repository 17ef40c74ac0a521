//! Keyword-overlap relevance scoring for context extraction.
//!
//! Sentence split on `.`, lowercase, whitespace word
//! sets. A chunk is relevant when it shares at least
//! [`MIN_SHARED_WORDS`] words with the question or is longer than
//! [`LONG_CHUNK_CHARS`] characters. Every function here is pure.

use std::collections::HashSet;

use crate::text::excerpt;

/// Shared words needed for a chunk to count as relevant.
pub const MIN_SHARED_WORDS: usize = 2;

/// Chunks longer than this (in characters) are relevant regardless of overlap.
pub const LONG_CHUNK_CHARS: usize = 200;

/// Relevant chunks kept per document.
pub const MAX_CHUNKS_PER_DOC: usize = 2;

/// Contexts kept per question.
pub const MAX_CONTEXTS: usize = 3;

/// Split text into sentence chunks on `.`, trimmed, empties dropped.
pub fn split_chunks(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Lowercased whitespace-separated word set.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Relevance decision for one chunk against the question's word set.
pub fn is_relevant(question_words: &HashSet<String>, chunk: &str) -> bool {
    if chunk.chars().count() > LONG_CHUNK_CHARS {
        return true;
    }
    let chunk_words = word_set(chunk);
    question_words.intersection(&chunk_words).count() >= MIN_SHARED_WORDS
}

/// Select 1 to [`MAX_CONTEXTS`] excerpts from `documents` for `question`.
///
/// Takes up to [`MAX_CHUNKS_PER_DOC`] relevant chunks per document in
/// order. When nothing qualifies, falls back to the first
/// `fallback_chars` characters of each document. The result is non-empty
/// as long as at least one document has content.
pub fn select_contexts(question: &str, documents: &[&str], fallback_chars: usize) -> Vec<String> {
    let question_words = word_set(question);

    let mut contexts: Vec<String> = documents
        .iter()
        .flat_map(|doc| {
            split_chunks(doc)
                .into_iter()
                .filter(|chunk| is_relevant(&question_words, chunk))
                .take(MAX_CHUNKS_PER_DOC)
        })
        .take(MAX_CONTEXTS)
        .map(str::to_string)
        .collect();

    if contexts.is_empty() {
        contexts = documents
            .iter()
            .map(|doc| excerpt(doc.trim(), fallback_chars.max(1)).to_string())
            .filter(|text| !text.is_empty())
            .take(MAX_CONTEXTS)
            .collect();
    }

    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks() {
        assert_eq!(
            split_chunks("First one. Second one.  . Third"),
            vec!["First one", "Second one", "Third"]
        );
        assert!(split_chunks(" . . ").is_empty());
    }

    #[test]
    fn test_word_set_lowercases() {
        let words = word_set("Federal Loans federal");
        assert_eq!(words.len(), 2);
        assert!(words.contains("federal"));
        assert!(words.contains("loans"));
    }

    #[test]
    fn test_is_relevant_overlap_threshold() {
        let q = word_set("What are federal loan limits");
        assert!(is_relevant(&q, "Federal loan programs exist"));
        assert!(!is_relevant(&q, "Federal programs exist"));
    }

    #[test]
    fn test_is_relevant_long_chunk() {
        let q = word_set("unrelated question");
        let long = "x".repeat(201);
        assert!(is_relevant(&q, &long));
        assert!(!is_relevant(&q, &"x".repeat(200)));
    }

    #[test]
    fn test_is_relevant_is_pure() {
        let q = word_set("interest rates for loans");
        let chunk = "Interest rates for federal loans are fixed";
        assert_eq!(is_relevant(&q, chunk), is_relevant(&q, chunk));
    }

    #[test]
    fn test_select_caps_per_doc_and_total() {
        let doc_a = "loan rates one. loan rates two. loan rates three";
        let doc_b = "loan rates four. loan rates five";
        let contexts = select_contexts("loan rates", &[doc_a, doc_b], 300);
        assert_eq!(
            contexts,
            vec!["loan rates one", "loan rates two", "loan rates four"]
        );
    }

    #[test]
    fn test_select_falls_back_to_prefix() {
        let doc = "Nothing matches here. Still nothing.";
        let contexts = select_contexts("quantum chromodynamics", &[doc], 10);
        assert_eq!(contexts, vec!["Nothing ma"]);
    }

    #[test]
    fn test_select_fallback_skips_empty_documents() {
        let contexts = select_contexts("anything", &["   ", "Body text"], 300);
        assert_eq!(contexts, vec!["Body text"]);
    }
}
