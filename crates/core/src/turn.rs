//! Conversational directives and turn history

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// The orchestrator's decision about what kind of utterance comes next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Session start: open with a question about a core skill
    Open,
    /// Strong answer: drill further into the same topic
    Deepen,
    /// Acknowledge and move to a different skill
    Pivot,
    /// Weak answer: reassure first, then move to a different skill
    ReassurePivot,
    /// Candidate asked for clarification: rephrase the same question simply
    Rephrase,
    /// Suspected cheating: gently ask for an explanation in their own words
    Confront,
    /// Off-topic answer: firm redirect onto a different skill
    Redirect,
    /// Turn budget exhausted: wrap up the interview
    Conclude,
}

impl Directive {
    /// Guidance handed to the synthesizer for this kind of utterance
    pub fn prompt_guidance(&self) -> &'static str {
        match self {
            Directive::Open => {
                "Greet the candidate briefly by name and ask one open-ended \
                 question about the given core skill."
            },
            Directive::Deepen => {
                "The answer was strong. Ask a harder follow-up that digs into \
                 the same topic: trade-offs, internals, or a concrete failure \
                 they have hit."
            },
            Directive::Pivot => {
                "Briefly acknowledge the answer, then ask one question about \
                 the given different skill."
            },
            Directive::ReassurePivot => {
                "The answer was weak. Reassure the candidate in one short \
                 clause (no lecture), then ask one question about the given \
                 different skill."
            },
            Directive::Rephrase => {
                "The candidate asked for clarification. Restate the previous \
                 question in simpler words. Do not add new content."
            },
            Directive::Confront => {
                "The answer sounded read or rehearsed. Without accusing, ask \
                 the candidate to explain the same idea in their own words, \
                 as if to a junior colleague."
            },
            Directive::Redirect => {
                "The answer was off topic. Firmly but politely steer back, \
                 then ask one question about the given different skill."
            },
            Directive::Conclude => {
                "Time is up. Thank the candidate warmly, tell them the team \
                 will be in touch, and do not ask anything further."
            },
        }
    }

    /// Whether this directive switches the conversation to a different skill
    pub fn is_pivot(&self) -> bool {
        matches!(
            self,
            Directive::Pivot | Directive::ReassurePivot | Directive::Redirect
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::Open => "open",
            Directive::Deepen => "deepen",
            Directive::Pivot => "pivot",
            Directive::ReassurePivot => "reassure_pivot",
            Directive::Rephrase => "rephrase",
            Directive::Confront => "confront",
            Directive::Redirect => "redirect",
            Directive::Conclude => "conclude",
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed question/answer exchange, kept for grader drift detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub question: String,
    pub answer: String,
    pub understanding_score: u8,
}

/// Bounded window of recent turns
///
/// The grader reads this to spot abrupt fluency jumps relative to earlier
/// answers. Oldest entries fall off once the window is full.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    entries: VecDeque<TurnRecord>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: TurnRecord) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TurnRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, score: u8) -> TurnRecord {
        TurnRecord {
            question: question.to_string(),
            answer: "an answer".to_string(),
            understanding_score: score,
        }
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = HistoryWindow::new(3);
        for i in 0..5 {
            window.push(record(&format!("q{}", i), i as u8));
        }
        assert_eq!(window.len(), 3);
        let questions: Vec<_> = window.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q3", "q4"]);
    }

    #[test]
    fn test_pivot_classification() {
        assert!(Directive::Pivot.is_pivot());
        assert!(Directive::Redirect.is_pivot());
        assert!(!Directive::Deepen.is_pivot());
        assert!(!Directive::Rephrase.is_pivot());
    }
}
