//! Boundary validation of generation requests.
//!
//! Blank documents are filtered here, before a run starts; the pipeline
//! itself rejects any blank document it is handed.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::{DEFAULT_TARGET_QUESTIONS, MAX_TARGET_QUESTIONS, MIN_TARGET_QUESTIONS};
use crate::errors::EvolError;
use crate::types::Document;

/// A generation request as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub documents: Vec<Document>,

    /// Requested question count. Clamped to `[3, 15]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_questions: Option<i64>,
}

/// A request that passed boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Non-blank documents in their original order.
    pub documents: Vec<Document>,
    /// Target inside `[3, 15]`.
    pub target_questions: usize,
    /// Number of blank documents dropped.
    pub filtered_documents: usize,
}

impl GenerateRequest {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            target_questions: None,
        }
    }

    pub fn with_target(mut self, target: i64) -> Self {
        self.target_questions = Some(target);
        self
    }

    /// Parse a request from JSON text.
    pub fn from_json(text: &str) -> Result<Self, EvolError> {
        serde_json::from_str(text)
            .map_err(|e| EvolError::InvalidRequest(format!("Invalid request JSON: {}", e)))
    }

    /// Validate with the built-in default target.
    pub fn validate(self) -> Result<ValidatedRequest, EvolError> {
        self.validate_with_default(DEFAULT_TARGET_QUESTIONS)
    }

    /// Validate, using `default_target` when the request names none.
    ///
    /// # Errors
    ///
    /// - [`EvolError::NoDocuments`] for an empty document list
    /// - [`EvolError::AllDocumentsEmpty`] when every document is blank
    pub fn validate_with_default(self, default_target: usize) -> Result<ValidatedRequest, EvolError> {
        if self.documents.is_empty() {
            return Err(EvolError::NoDocuments);
        }

        let submitted = self.documents.len();
        let documents: Vec<Document> = self.documents.into_iter().filter(|d| !d.is_blank()).collect();
        if documents.is_empty() {
            return Err(EvolError::AllDocumentsEmpty);
        }

        let filtered_documents = submitted - documents.len();
        if filtered_documents > 0 {
            warn!("Filtered out {} empty documents", filtered_documents);
        }

        let requested = self.target_questions.unwrap_or(default_target as i64);
        let target_questions = clamp_target(requested);
        if target_questions as i64 != requested {
            info!(requested, target_questions, "Clamped target question count");
        }

        Ok(ValidatedRequest {
            documents,
            target_questions,
            filtered_documents,
        })
    }
}

/// Clamp a requested target to `[3, 15]`.
pub fn clamp_target(requested: i64) -> usize {
    requested.clamp(MIN_TARGET_QUESTIONS as i64, MAX_TARGET_QUESTIONS as i64) as usize
}

/// Built-in request over three sample student-loan documents, target 9.
pub fn demo_request() -> GenerateRequest {
    let documents = vec![
        Document::new(
            "Student loans are financial aid that help students pay for college expenses including tuition, books, and living costs. \
             There are two main types: federal student loans and private student loans. \
             Federal loans typically offer better terms, including fixed interest rates, income-driven repayment options, and potential loan forgiveness programs. \
             Students must complete the Free Application for Federal Student Aid (FAFSA) to be considered for federal aid.",
        )
        .with_metadata("source", "loan_basics.pdf")
        .with_metadata("page", 1)
        .with_metadata("section", "introduction"),
        Document::new(
            "Direct Subsidized Loans are available to undergraduate students with demonstrated financial need. \
             The government pays the interest while students are in school at least half-time, during grace periods, and during authorized periods of deferment. \
             Direct Unsubsidized Loans are available to undergraduate and graduate students regardless of financial need. \
             Interest accrues from the time the loan is disbursed until it's paid in full.",
        )
        .with_metadata("source", "federal_loans.pdf")
        .with_metadata("page", 2)
        .with_metadata("section", "loan_types"),
        Document::new(
            "To qualify for federal student aid, students must meet eligibility requirements including being a U.S. citizen or eligible non-citizen, \
             having a valid Social Security number, and maintaining satisfactory academic progress. \
             Students must also complete the FAFSA annually and may need to provide additional documentation for verification. \
             The Expected Family Contribution (EFC) calculated from FAFSA determines aid eligibility.",
        )
        .with_metadata("source", "eligibility.pdf")
        .with_metadata("page", 3)
        .with_metadata("section", "requirements"),
    ];

    GenerateRequest::new(documents).with_target(DEFAULT_TARGET_QUESTIONS as i64)
}

/// Example request body with two documents.
pub fn example_request_json() -> serde_json::Value {
    json!({
        "documents": [
            {
                "content": "Your document content here. This should be substantial text that contains information suitable for question generation.",
                "metadata": { "source": "document1.pdf", "page": 1 }
            },
            {
                "content": "Additional document content. Multiple documents enable multi-context evolution questions.",
                "metadata": { "source": "document2.pdf", "page": 1 }
            }
        ],
        "target_questions": 9
    })
}
