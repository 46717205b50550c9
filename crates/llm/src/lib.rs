//! Reasoning engine integration
//!
//! Features:
//! - Gemini-style backend with schema-constrained JSON output
//! - Answer grading against the interview rubric
//! - Spoken response synthesis with hard format constraints
//! - Retry with exponential backoff for transient failures

pub mod backend;
pub mod grader;
pub mod prompt;
pub mod schema;
pub mod synthesizer;

pub use backend::{GeminiBackend, ReasoningBackend, ReasoningRequest};
pub use grader::AnswerGrader;
pub use prompt::{Message, PromptBuilder, Role};
pub use schema::{judgment_schema, SchemaBuilder};
pub use synthesizer::{is_closing, strip_closing, ResponseSynthesizer, SynthesisContext, CLOSING_PREFIX};

use thiserror::Error;

/// Reasoning engine errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for interviewer_core::Error {
    fn from(err: LlmError) -> Self {
        interviewer_core::Error::Reasoning(err.to_string())
    }
}
