//! Turn orchestration state machine
//!
//! `TurnEngine` owns the per-session turn state: the turn counter, the
//! drill depth on the current topic, and the skill rotation cursor. It is
//! driven by exactly one session task; nothing else mutates it.
//!
//! Decision rules are evaluated in priority order, first match wins:
//! clarification, cheating, off-topic, weak answer, strong answer with
//! drill room, strong answer at max drill, everything else. The budget
//! gate runs before grading is even attempted, so a session at its turn
//! limit wraps up without another reasoning call.

use interviewer_config::InterviewConfig;
use interviewer_core::{AnswerJudgment, Directive};

/// Phases of the turn loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewPhase {
    /// Session started, opening question not yet asked
    AwaitingFirstTurn,
    /// Opening question asked, waiting for a candidate utterance
    AwaitingAnswer,
    /// Candidate utterance is being graded
    Grading,
    /// Judgment received, directive being selected
    Deciding,
    /// Next utterance is being synthesized
    Synthesizing,
    /// Next utterance is being spoken
    Speaking,
    /// Terminal; no further candidate input is graded
    Finished,
}

/// In-memory, session-scoped turn state
#[derive(Debug, Clone)]
pub struct TurnState {
    /// Completed turns charged against the budget
    pub turn: u32,
    /// Consecutive deepening follow-ups on the current topic
    pub drill_depth: u32,
    /// The question currently awaiting an answer
    pub last_question: String,
}

/// Gate result checked before grading each utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnGate {
    /// Budget remains; grade the utterance
    Proceed,
    /// Budget exhausted; skip grading and wrap up
    WrapUp,
    /// Session already finished; drop the input
    Ignore,
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub directive: Directive,
    /// Whether the exchange was charged against the turn budget
    pub charged: bool,
}

/// The turn orchestration state machine
#[derive(Debug)]
pub struct TurnEngine {
    policy: InterviewConfig,
    phase: InterviewPhase,
    state: TurnState,
    /// Rotation cursor over the rubric's ordered skills
    skill_cursor: usize,
}

impl TurnEngine {
    pub fn new(policy: InterviewConfig) -> Self {
        Self {
            policy,
            phase: InterviewPhase::AwaitingFirstTurn,
            state: TurnState {
                turn: 0,
                drill_depth: 0,
                last_question: String::new(),
            },
            skill_cursor: 0,
        }
    }

    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// Index of the skill currently under discussion
    pub fn skill_cursor(&self) -> usize {
        self.skill_cursor
    }

    /// Issue the opening directive. No judgment exists yet.
    pub fn open(&mut self) -> Directive {
        debug_assert_eq!(self.phase, InterviewPhase::AwaitingFirstTurn);
        self.phase = InterviewPhase::Synthesizing;
        Directive::Open
    }

    /// Budget gate, checked before grading each candidate utterance
    pub fn gate(&mut self) -> TurnGate {
        match self.phase {
            InterviewPhase::Finished => TurnGate::Ignore,
            _ if self.state.turn >= self.policy.max_turns => {
                self.phase = InterviewPhase::Synthesizing;
                TurnGate::WrapUp
            },
            _ => {
                self.phase = InterviewPhase::Grading;
                TurnGate::Proceed
            },
        }
    }

    /// Consume a judgment and select the next directive
    pub fn decide(&mut self, judgment: &AnswerJudgment) -> Decision {
        self.phase = InterviewPhase::Deciding;
        let score = judgment.understanding_score;

        let decision = if judgment.needs_clarification {
            // Uncounted retry of the same question; drill depth unchanged
            Decision {
                directive: Directive::Rephrase,
                charged: false,
            }
        } else if judgment.is_cheating_suspected {
            // Drill depth unchanged; the candidate re-answers in own words
            Decision {
                directive: Directive::Confront,
                charged: true,
            }
        } else if judgment.is_off_topic {
            self.pivot_topic();
            Decision {
                directive: Directive::Redirect,
                charged: true,
            }
        } else if score < self.policy.low_threshold {
            self.pivot_topic();
            Decision {
                directive: Directive::ReassurePivot,
                charged: true,
            }
        } else if score >= self.policy.excellent_threshold
            && self.state.drill_depth + 1 < self.policy.max_drill_depth
        {
            // One more follow-up stays under the drill cap
            self.state.drill_depth += 1;
            Decision {
                directive: Directive::Deepen,
                charged: true,
            }
        } else if score >= self.policy.excellent_threshold {
            self.pivot_topic();
            Decision {
                directive: Directive::Pivot,
                charged: true,
            }
        } else {
            self.pivot_topic();
            Decision {
                directive: Directive::Pivot,
                charged: true,
            }
        };

        if decision.charged {
            self.state.turn += 1;
        }
        self.phase = InterviewPhase::Synthesizing;

        tracing::debug!(
            directive = %decision.directive,
            charged = decision.charged,
            turn = self.state.turn,
            drill_depth = self.state.drill_depth,
            "decision made"
        );

        decision
    }

    /// Charge a turn whose grading or synthesis failed outright.
    ///
    /// The exchange still counts against the budget so a pathological
    /// failure loop cannot stall the session indefinitely.
    pub fn charge_degraded_turn(&mut self) {
        self.state.turn += 1;
        self.phase = InterviewPhase::AwaitingAnswer;
    }

    /// Record that the synthesized utterance was spoken
    pub fn utterance_spoken(&mut self, question: &str, concluding: bool) {
        self.phase = InterviewPhase::Speaking;
        if concluding {
            self.phase = InterviewPhase::Finished;
        } else {
            self.state.last_question = question.to_string();
            self.phase = InterviewPhase::AwaitingAnswer;
        }
    }

    fn pivot_topic(&mut self) {
        self.state.drill_depth = 0;
        self.skill_cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TurnEngine {
        TurnEngine::new(InterviewConfig::default())
    }

    fn judgment(score: u8) -> AnswerJudgment {
        AnswerJudgment {
            understanding_score: score,
            explainability_score: score,
            ..Default::default()
        }
    }

    fn run_opening(engine: &mut TurnEngine) {
        engine.open();
        engine.utterance_spoken("Tell me about async runtimes?", false);
    }

    fn run_turn(engine: &mut TurnEngine, j: &AnswerJudgment) -> Decision {
        assert_eq!(engine.gate(), TurnGate::Proceed);
        let decision = engine.decide(j);
        engine.utterance_spoken("Next question?", false);
        decision
    }

    #[test]
    fn test_opening_directive() {
        let mut e = engine();
        assert_eq!(e.open(), Directive::Open);
        e.utterance_spoken("First question?", false);
        assert_eq!(e.phase(), InterviewPhase::AwaitingAnswer);
        assert_eq!(e.state().last_question, "First question?");
    }

    #[test]
    fn test_turn_counter_never_exceeds_budget() {
        let mut e = engine();
        run_opening(&mut e);
        let j = judgment(6);
        for _ in 0..6 {
            run_turn(&mut e, &j);
        }
        assert_eq!(e.state().turn, 6);
        // Budget reached: the next utterance short-circuits grading
        assert_eq!(e.gate(), TurnGate::WrapUp);
        e.utterance_spoken("Thanks for your time.", true);
        assert_eq!(e.phase(), InterviewPhase::Finished);
        assert_eq!(e.state().turn, 6);
        // Finished is absorbing
        assert_eq!(e.gate(), TurnGate::Ignore);
    }

    #[test]
    fn test_clarification_never_charges_budget() {
        let mut e = engine();
        run_opening(&mut e);
        run_turn(&mut e, &judgment(6));
        run_turn(&mut e, &judgment(6));
        assert_eq!(e.state().turn, 2);

        let mut clarify = judgment(0);
        clarify.needs_clarification = true;
        let decision = run_turn(&mut e, &clarify.normalize());
        assert_eq!(decision.directive, Directive::Rephrase);
        assert!(!decision.charged);
        assert_eq!(e.state().turn, 2);
    }

    #[test]
    fn test_drill_resets_on_anything_but_deepen() {
        let mut e = engine();
        run_opening(&mut e);
        assert_eq!(run_turn(&mut e, &judgment(9)).directive, Directive::Deepen);
        assert_eq!(e.state().drill_depth, 1);

        // Weak answer resets
        assert_eq!(
            run_turn(&mut e, &judgment(2)).directive,
            Directive::ReassurePivot
        );
        assert_eq!(e.state().drill_depth, 0);

        // Build depth again, then off-topic resets
        run_turn(&mut e, &judgment(9));
        let mut off = judgment(9);
        off.is_off_topic = true;
        assert_eq!(
            run_turn(&mut e, &off.normalize()).directive,
            Directive::Redirect
        );
        assert_eq!(e.state().drill_depth, 0);
    }

    #[test]
    fn test_strong_answers_drill_then_pivot() {
        // Scores [9, 9, 6]: deepen once, then the next strong answer would
        // reach the drill cap, so it pivots and resets
        let mut e = engine();
        run_opening(&mut e);

        let d1 = run_turn(&mut e, &judgment(9));
        assert_eq!(d1.directive, Directive::Deepen);
        assert_eq!(e.state().drill_depth, 1);

        let d2 = run_turn(&mut e, &judgment(9));
        assert_eq!(d2.directive, Directive::Pivot);
        assert_eq!(e.state().drill_depth, 0);

        // Middling score pivots too
        let d3 = run_turn(&mut e, &judgment(6));
        assert_eq!(d3.directive, Directive::Pivot);
        assert_eq!(e.state().drill_depth, 0);
    }

    #[test]
    fn test_cheating_takes_priority_over_score() {
        let mut e = engine();
        run_opening(&mut e);
        run_turn(&mut e, &judgment(9));
        let depth_before = e.state().drill_depth;

        let mut cheat = judgment(9);
        cheat.is_cheating_suspected = true;
        let decision = run_turn(&mut e, &cheat);
        assert_eq!(decision.directive, Directive::Confront);
        assert!(decision.charged);
        // Drill depth unchanged by a confrontation
        assert_eq!(e.state().drill_depth, depth_before);
    }

    #[test]
    fn test_clarification_outranks_cheating() {
        let mut e = engine();
        run_opening(&mut e);
        let mut j = judgment(0);
        j.needs_clarification = true;
        j.is_cheating_suspected = true;
        assert_eq!(run_turn(&mut e, &j).directive, Directive::Rephrase);
    }

    #[test]
    fn test_pivot_advances_skill_cursor() {
        let mut e = engine();
        run_opening(&mut e);
        assert_eq!(e.skill_cursor(), 0);
        run_turn(&mut e, &judgment(9));
        // Deepen stays on topic
        assert_eq!(e.skill_cursor(), 0);
        run_turn(&mut e, &judgment(5));
        assert_eq!(e.skill_cursor(), 1);
    }

    #[test]
    fn test_degraded_turn_still_charged() {
        let mut e = engine();
        run_opening(&mut e);
        assert_eq!(e.gate(), TurnGate::Proceed);
        e.charge_degraded_turn();
        assert_eq!(e.state().turn, 1);
        assert_eq!(e.phase(), InterviewPhase::AwaitingAnswer);
    }
}
