//! Structured answer judgments
//!
//! The reasoning engine returns a judgment as schema-constrained JSON. The
//! struct here is the typed boundary: every optional field carries a serde
//! default so a missing or null value never becomes an error deeper in the
//! orchestrator, and `normalize()` applies the score-forcing rules right
//! after deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Normalize a null array from the model into an empty list
fn null_to_empty<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(de)?.unwrap_or_default())
}

/// Per-turn grading output for one candidate answer
///
/// Created by the grader, consumed by the orchestrator and the background
/// recorder; never mutated after `normalize()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerJudgment {
    /// How well the candidate understands the topic (1-10)
    #[serde(default)]
    pub understanding_score: u8,
    /// How clearly they can explain it (1-10)
    #[serde(default)]
    pub explainability_score: u8,
    /// Verbatim quote from the answer supporting the score
    #[serde(default)]
    pub evidence: String,
    /// Short critique of the answer
    #[serde(default)]
    pub critique: String,
    /// What a strong answer would have covered
    #[serde(default)]
    pub ideal_answer: String,
    /// Technical concepts the candidate missed
    #[serde(default, deserialize_with = "null_to_empty")]
    pub missed_concepts: Vec<String>,
    /// Answer looks read or externally assisted
    #[serde(default)]
    pub is_cheating_suspected: bool,
    /// Why cheating is suspected, when it is
    #[serde(default)]
    pub cheating_reason: Option<String>,
    /// Nonsensical or entirely unrelated content
    #[serde(default)]
    pub is_off_topic: bool,
    /// Candidate explicitly asked for the question to be repeated/explained
    #[serde(default)]
    pub needs_clarification: bool,
    /// Grading may be biased by non-technical attributes
    #[serde(default)]
    pub bias_flag: bool,
}

impl AnswerJudgment {
    /// Apply score-forcing rules and clamp scores into range.
    ///
    /// Off-topic answers score 0 regardless of text. Clarification requests
    /// score 0 and are not charged against the turn budget (the orchestrator
    /// handles the budget part).
    pub fn normalize(mut self) -> Self {
        self.understanding_score = self.understanding_score.min(10);
        self.explainability_score = self.explainability_score.min(10);
        if self.is_off_topic || self.needs_clarification {
            self.understanding_score = 0;
            self.explainability_score = 0;
        }
        if !self.is_cheating_suspected {
            self.cheating_reason = None;
        }
        self
    }
}

impl Default for AnswerJudgment {
    fn default() -> Self {
        Self {
            understanding_score: 0,
            explainability_score: 0,
            evidence: String::new(),
            critique: String::new(),
            ideal_answer: String::new(),
            missed_concepts: Vec::new(),
            is_cheating_suspected: false,
            cheating_reason: None,
            is_off_topic: false,
            needs_clarification: false,
            bias_flag: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_missed_concepts_normalized() {
        let json = r#"{
            "understanding_score": 7,
            "explainability_score": 6,
            "evidence": "used tokio::select in production",
            "critique": "solid",
            "ideal_answer": "",
            "missed_concepts": null,
            "is_cheating_suspected": false,
            "is_off_topic": false,
            "needs_clarification": false,
            "bias_flag": false
        }"#;
        let judgment: AnswerJudgment = serde_json::from_str(json).unwrap();
        assert!(judgment.missed_concepts.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let judgment: AnswerJudgment = serde_json::from_str(r#"{"understanding_score": 9}"#).unwrap();
        assert_eq!(judgment.understanding_score, 9);
        assert!(!judgment.is_cheating_suspected);
        assert!(judgment.missed_concepts.is_empty());
    }

    #[test]
    fn test_off_topic_forces_zero() {
        let judgment = AnswerJudgment {
            understanding_score: 8,
            explainability_score: 7,
            is_off_topic: true,
            ..Default::default()
        }
        .normalize();
        assert_eq!(judgment.understanding_score, 0);
        assert_eq!(judgment.explainability_score, 0);
    }

    #[test]
    fn test_clarification_forces_zero() {
        let judgment = AnswerJudgment {
            understanding_score: 5,
            needs_clarification: true,
            ..Default::default()
        }
        .normalize();
        assert_eq!(judgment.understanding_score, 0);
    }

    #[test]
    fn test_scores_clamped() {
        let judgment = AnswerJudgment {
            understanding_score: 42,
            ..Default::default()
        }
        .normalize();
        assert_eq!(judgment.understanding_score, 10);
    }

    #[test]
    fn test_cheating_reason_dropped_without_flag() {
        let judgment = AnswerJudgment {
            cheating_reason: Some("polished".to_string()),
            ..Default::default()
        }
        .normalize();
        assert!(judgment.cheating_reason.is_none());
    }
}
