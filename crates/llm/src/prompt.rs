//! Prompt building for grading and synthesis
//!
//! One `PromptBuilder` is constructed per session from the job posting and
//! rubric; it renders the system instruction once and the per-turn prompts
//! from current conversation state.

use std::fmt;

use serde::{Deserialize, Serialize};

use interviewer_config::InterviewConfig;
use interviewer_core::{Directive, HistoryWindow, Rubric};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name on the generateContent wire ("model" for the assistant)
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Per-session prompt builder
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    job_title: String,
    candidate_name: String,
    rubric: Rubric,
    policy: InterviewConfig,
}

impl PromptBuilder {
    pub fn new(
        job_title: impl Into<String>,
        candidate_name: impl Into<String>,
        rubric: Rubric,
        policy: InterviewConfig,
    ) -> Self {
        Self {
            job_title: job_title.into(),
            candidate_name: candidate_name.into(),
            rubric,
            policy,
        }
    }

    /// System instructions shared by every call in the session
    pub fn system_instruction(&self) -> String {
        format!(
            "You are a fast-paced, conversational technical interviewer for the position of {title}. \
             Candidate name: {name}. Target experience level: {level}. \
             Core skills under evaluation: {skills}. Evaluation focus: {focus}. \
             Keep all spoken replies very short and conversational, and never use markdown.",
            title = self.job_title,
            name = self.candidate_name,
            level = self.rubric.experience_level,
            skills = self.rubric.core_skills.join(", "),
            focus = self.rubric.evaluation_focus.join(", "),
        )
    }

    /// Grading prompt for one candidate answer
    pub fn grading_prompt(
        &self,
        question: &str,
        answer: &str,
        response_gap_secs: f32,
        history: &HistoryWindow,
    ) -> String {
        let mut prompt = String::with_capacity(1024);

        prompt.push_str(
            "Grade the candidate's spoken answer to the interview question below. \
             Return ONLY the JSON object described by the output schema.\n\n",
        );
        prompt.push_str(&format!("QUESTION: {}\n", question));
        prompt.push_str(&format!("ANSWER: {}\n", answer));
        prompt.push_str(&format!(
            "RESPONSE GAP: {:.1} seconds between the end of the question and the first word of the answer.\n",
            response_gap_secs
        ));

        if !history.is_empty() {
            prompt.push_str("\nRECENT TURNS (oldest first, for drift detection):\n");
            for record in history.iter() {
                prompt.push_str(&format!(
                    "- Q: {} | A: {} | understanding: {}\n",
                    record.question, record.answer, record.understanding_score
                ));
            }
        }

        prompt.push_str(&format!(
            "\nSCORING POLICY:\n\
             - 8-10: specific, accurate, demonstrates hands-on architectural or tooling knowledge.\n\
             - 5-7: correct but shallow, OR an honest admission of only surface-level practical \
             familiarity. Never push honesty about limits into the 1-4 band.\n\
             - 1-4: incorrect, evasive, or no demonstrated knowledge.\n\
             - is_off_topic: true only for nonsensical or entirely unrelated content; score both \
             scores 0 when true.\n\
             - is_cheating_suspected: true if the response gap exceeds {gap:.0} seconds AND the \
             answer reads unnaturally polished or textbook-like, OR if there is an abrupt large \
             jump in fluency or vocabulary compared to the recent turns above. Give the reason \
             in cheating_reason.\n\
             - needs_clarification: true only if the candidate explicitly asks for the question \
             to be repeated or explained; score both scores 0 when true.\n\
             - missed_concepts: technical concepts a strong answer would have covered.\n\
             - bias_flag: true if your grading may have been influenced by anything other than \
             technical content.\n",
            gap = self.policy.cheating_gap_secs
        ));

        prompt
    }

    /// Synthesis prompt for the next spoken utterance
    pub fn synthesis_prompt(
        &self,
        directive: Directive,
        target_skill: &str,
        last_question: &str,
        last_answer: &str,
    ) -> String {
        let mut prompt = String::with_capacity(512);

        prompt.push_str(&format!("DIRECTIVE: {}\n", directive.prompt_guidance()));
        match directive {
            Directive::Open => {
                prompt.push_str(&format!("SKILL TO OPEN WITH: {}\n", target_skill));
            },
            Directive::Deepen | Directive::Rephrase | Directive::Confront => {
                prompt.push_str(&format!("PREVIOUS QUESTION: {}\n", last_question));
                prompt.push_str(&format!("CANDIDATE SAID: {}\n", last_answer));
            },
            Directive::Pivot | Directive::ReassurePivot | Directive::Redirect => {
                prompt.push_str(&format!("CANDIDATE SAID: {}\n", last_answer));
                prompt.push_str(&format!("NEXT SKILL: {}\n", target_skill));
            },
            Directive::Conclude => {
                prompt.push_str(&format!("CANDIDATE SAID: {}\n", last_answer));
            },
        }

        prompt.push_str(
            "\nReply with the exact words to speak: at most two sentences, casual spoken \
             register, no lists, no markdown",
        );
        if directive == Directive::Conclude {
            prompt.push_str(", and no further questions.\n");
        } else {
            prompt.push_str(", ending with exactly one question.\n");
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::TurnRecord;

    fn builder() -> PromptBuilder {
        let rubric = Rubric {
            languages: vec!["Rust".to_string()],
            experience_level: "Senior".to_string(),
            core_skills: vec!["Async Runtimes".to_string(), "Ownership".to_string()],
            evaluation_focus: vec!["Technical Depth".to_string()],
        };
        PromptBuilder::new("Rust Engineer", "Ada", rubric, InterviewConfig::default())
    }

    #[test]
    fn test_system_instruction_mentions_rubric() {
        let instruction = builder().system_instruction();
        assert!(instruction.contains("Rust Engineer"));
        assert!(instruction.contains("Ada"));
        assert!(instruction.contains("Async Runtimes"));
    }

    #[test]
    fn test_grading_prompt_includes_history_and_gap() {
        let mut history = HistoryWindow::new(3);
        history.push(TurnRecord {
            question: "What is Send?".to_string(),
            answer: "A marker trait".to_string(),
            understanding_score: 8,
        });
        let prompt = builder().grading_prompt("What is Sync?", "No idea", 9.2, &history);
        assert!(prompt.contains("9.2 seconds"));
        assert!(prompt.contains("What is Send?"));
        assert!(prompt.contains("8 seconds AND"));
    }

    #[test]
    fn test_synthesis_prompt_varies_by_directive() {
        let b = builder();
        let open = b.synthesis_prompt(Directive::Open, "Ownership", "", "");
        assert!(open.contains("SKILL TO OPEN WITH: Ownership"));
        assert!(open.contains("exactly one question"));

        let conclude = b.synthesis_prompt(Directive::Conclude, "", "", "thanks");
        assert!(conclude.contains("no further questions"));
    }
}
