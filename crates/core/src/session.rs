//! Interview session and stage types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rubric::Rubric;

/// Stages of an interview session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStage {
    /// Greeting and opening question
    #[default]
    Intro,
    /// Main technical questioning loop
    Technical,
    /// Interview finished, report available
    Completed,
}

impl InterviewStage {
    /// Check if transition to target stage is allowed
    pub fn can_transition_to(&self, target: InterviewStage) -> bool {
        matches!(
            (self, target),
            (InterviewStage::Intro, InterviewStage::Technical)
                | (InterviewStage::Intro, InterviewStage::Completed)
                | (InterviewStage::Technical, InterviewStage::Completed)
        )
    }

    /// Get default next stage
    pub fn default_next(&self) -> Option<InterviewStage> {
        match self {
            InterviewStage::Intro => Some(InterviewStage::Technical),
            InterviewStage::Technical => Some(InterviewStage::Completed),
            InterviewStage::Completed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStage::Intro => "intro",
            InterviewStage::Technical => "technical",
            InterviewStage::Completed => "completed",
        }
    }
}

impl std::fmt::Display for InterviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate's interview session
///
/// Owned by the orchestrator for the session's lifetime; mutated only by the
/// orchestrator and by the end-of-session scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_name: String,
    pub rubric: Rubric,
    pub stage: InterviewStage,
    pub is_completed: bool,
    /// Final score, `None` until the session is scored
    pub overall_score: Option<u32>,
    pub started_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(job_id: Uuid, job_title: impl Into<String>, candidate_name: impl Into<String>, rubric: Rubric) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            job_title: job_title.into(),
            candidate_name: candidate_name.into(),
            rubric,
            stage: InterviewStage::Intro,
            is_completed: false,
            overall_score: None,
            started_at: Utc::now(),
        }
    }

    /// Advance to the given stage if the transition is allowed
    pub fn transition_to(&mut self, target: InterviewStage) -> bool {
        if self.stage.can_transition_to(target) {
            self.stage = target;
            if target == InterviewStage::Completed {
                self.is_completed = true;
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InterviewSession {
        let rubric = Rubric {
            languages: vec!["Rust".to_string()],
            experience_level: "Senior".to_string(),
            core_skills: vec!["Ownership".to_string()],
            evaluation_focus: vec![],
        };
        InterviewSession::new(Uuid::new_v4(), "Rust Engineer", "Ada", rubric)
    }

    #[test]
    fn test_stage_transitions() {
        let stage = InterviewStage::Intro;
        assert!(stage.can_transition_to(InterviewStage::Technical));
        assert!(stage.can_transition_to(InterviewStage::Completed));
        assert!(!InterviewStage::Completed.can_transition_to(InterviewStage::Intro));
    }

    #[test]
    fn test_completion_sets_flag() {
        let mut s = session();
        assert!(s.transition_to(InterviewStage::Technical));
        assert!(!s.is_completed);
        assert!(s.transition_to(InterviewStage::Completed));
        assert!(s.is_completed);
        // Completed is terminal
        assert!(!s.transition_to(InterviewStage::Technical));
    }
}
