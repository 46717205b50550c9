//! Answer grading
//!
//! A pure evaluation call: question + answer + timing + recent history in,
//! typed judgment out. Failures propagate to the caller; the turn loop
//! decides how to degrade, not this module.

use std::sync::Arc;

use interviewer_core::{AnswerJudgment, HistoryWindow};

use crate::backend::{ReasoningBackend, ReasoningRequest};
use crate::prompt::{Message, PromptBuilder};
use crate::schema::judgment_schema;
use crate::LlmError;

/// Grades one candidate answer against the rubric
pub struct AnswerGrader {
    backend: Arc<dyn ReasoningBackend>,
    prompts: PromptBuilder,
    schema: serde_json::Value,
}

impl AnswerGrader {
    pub fn new(backend: Arc<dyn ReasoningBackend>, prompts: PromptBuilder) -> Self {
        Self {
            backend,
            prompts,
            schema: judgment_schema(),
        }
    }

    /// Grade an answer. Returns a normalized judgment or the backend error.
    pub async fn grade(
        &self,
        question: &str,
        answer: &str,
        response_gap_secs: f32,
        history: &HistoryWindow,
    ) -> Result<AnswerJudgment, LlmError> {
        let prompt = self
            .prompts
            .grading_prompt(question, answer, response_gap_secs, history);
        let request = ReasoningRequest::new(
            self.prompts.system_instruction(),
            vec![Message::user(prompt)],
        );

        let raw = self.backend.generate_json(&request, &self.schema).await?;
        let judgment: AnswerJudgment = serde_json::from_value(raw)
            .map_err(|e| LlmError::InvalidResponse(format!("judgment did not match schema: {}", e)))?;

        let judgment = judgment.normalize();
        tracing::debug!(
            understanding = judgment.understanding_score,
            cheating = judgment.is_cheating_suspected,
            off_topic = judgment.is_off_topic,
            clarification = judgment.needs_clarification,
            "answer graded"
        );

        Ok(judgment)
    }
}
