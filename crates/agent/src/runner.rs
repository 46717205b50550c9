//! Per-session interview driver
//!
//! Wires the turn loop together: budget gate, grading, decision, background
//! recording, synthesis, speech. Exactly one task drives a runtime; all
//! turn state lives here or in the engine, never shared.
//!
//! Failure semantics: any grading or synthesis error degrades to a generic
//! filler reply without terminating the session or corrupting turn state.
//! The exchange is still charged so a pathological failure loop cannot
//! stall the session indefinitely. The candidate always hears something.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use interviewer_core::{Directive, HistoryWindow, Rubric, TurnRecord};
use interviewer_llm::{
    is_closing, strip_closing, AnswerGrader, ResponseSynthesizer, SynthesisContext,
};
use interviewer_persistence::AnswerMetricRecord;
use interviewer_pipeline::Utterance;

use crate::orchestrator::{InterviewPhase, TurnEngine, TurnGate};
use crate::recorder::EvidenceRecorder;
use crate::speech::SpeechOutput;
use crate::AgentError;

/// Fallback reply when grading or synthesis fails mid-turn
const FILLER_REPLY: &str = "Could you elaborate on that?";

/// Outcome of processing one candidate utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input arrived after the session finished; dropped
    Ignored,
    /// An ordinary turn was spoken
    Spoken { directive: Directive },
    /// Backend failure; filler reply spoken, turn charged
    Degraded,
    /// Budget exhausted; closing remark spoken, session finished
    Concluded,
}

/// Collaborators injected into a runtime
pub struct RuntimeDeps {
    pub grader: AnswerGrader,
    pub synthesizer: ResponseSynthesizer,
    pub speech: Arc<dyn SpeechOutput>,
    pub recorder: Arc<EvidenceRecorder>,
}

/// Drives one interview session turn by turn
pub struct InterviewRuntime {
    session_id: Uuid,
    rubric: Rubric,
    engine: TurnEngine,
    history: HistoryWindow,
    deps: RuntimeDeps,
    /// Completion instant of the last spoken utterance, for gap measurement
    last_speech_ended: Option<Instant>,
}

impl InterviewRuntime {
    pub fn new(
        session_id: Uuid,
        rubric: Rubric,
        engine: TurnEngine,
        history_window: usize,
        deps: RuntimeDeps,
    ) -> Self {
        Self {
            session_id,
            rubric,
            engine,
            history: HistoryWindow::new(history_window),
            deps,
            last_speech_ended: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn turn_count(&self) -> u32 {
        self.engine.state().turn
    }

    pub fn drill_depth(&self) -> u32 {
        self.engine.state().drill_depth
    }

    pub fn last_question(&self) -> &str {
        &self.engine.state().last_question
    }

    pub fn is_finished(&self) -> bool {
        self.engine.phase() == InterviewPhase::Finished
    }

    fn current_skill(&self) -> &str {
        self.rubric.skill_at(self.engine.skill_cursor())
    }

    /// Speak the opening question. Called once, right after connect.
    pub async fn open(&mut self) -> Result<String, AgentError> {
        let directive = self.engine.open();
        let skill = self.current_skill().to_string();
        let context = SynthesisContext {
            target_skill: skill.clone(),
            ..Default::default()
        };

        let text = match self.deps.synthesizer.synthesize(directive, &context).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "opening synthesis failed: {}", e);
                format!(
                    "Thanks for joining, let's get started. Could you tell me about your experience with {}?",
                    skill
                )
            },
        };

        let ended = self.deps.speech.speak(&self.session_id, &text).await?;
        self.last_speech_ended = Some(ended);
        self.engine.utterance_spoken(&text, false);

        tracing::info!(session_id = %self.session_id, skill = %skill, "interview opened");
        Ok(text)
    }

    /// Process one complete candidate utterance
    pub async fn handle_utterance(&mut self, utterance: Utterance) -> Result<TurnOutcome, AgentError> {
        match self.engine.gate() {
            TurnGate::Ignore => {
                tracing::debug!(session_id = %self.session_id, "utterance after finish; ignored");
                Ok(TurnOutcome::Ignored)
            },
            TurnGate::WrapUp => self.conclude(&utterance.text).await,
            TurnGate::Proceed => self.run_turn(utterance).await,
        }
    }

    async fn run_turn(&mut self, utterance: Utterance) -> Result<TurnOutcome, AgentError> {
        let question = self.engine.state().last_question.clone();
        let response_gap_secs = self
            .last_speech_ended
            .map(|ended| {
                utterance
                    .first_fragment_at
                    .saturating_duration_since(ended)
                    .as_secs_f32()
            })
            .unwrap_or(0.0);

        let judgment = match self
            .deps
            .grader
            .grade(&question, &utterance.text, response_gap_secs, &self.history)
            .await
        {
            Ok(judgment) => judgment,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "grading failed: {}", e);
                self.engine.charge_degraded_turn();
                return self.speak_filler().await;
            },
        };

        // Skill under discussion before any pivot moves the cursor
        let skill = self.current_skill().to_string();
        let decision = self.engine.decide(&judgment);

        // Persistence must never delay the reply
        let record =
            AnswerMetricRecord::from_judgment(self.session_id, &question, &utterance.text, &judgment);
        self.deps.recorder.dispatch(record, &skill);

        self.history.push(TurnRecord {
            question: question.clone(),
            answer: utterance.text.clone(),
            understanding_score: judgment.understanding_score,
        });

        let context = SynthesisContext {
            target_skill: self.current_skill().to_string(),
            last_question: question,
            last_answer: utterance.text,
        };
        let text = match self
            .deps
            .synthesizer
            .synthesize(decision.directive, &context)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "synthesis failed: {}", e);
                FILLER_REPLY.to_string()
            },
        };

        let ended = self.deps.speech.speak(&self.session_id, &text).await?;
        self.last_speech_ended = Some(ended);
        self.engine.utterance_spoken(&text, false);

        Ok(TurnOutcome::Spoken {
            directive: decision.directive,
        })
    }

    async fn conclude(&mut self, last_answer: &str) -> Result<TurnOutcome, AgentError> {
        let context = SynthesisContext {
            last_answer: last_answer.to_string(),
            ..Default::default()
        };
        let text = match self
            .deps
            .synthesizer
            .synthesize(Directive::Conclude, &context)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "closing synthesis failed: {}", e);
                format!(
                    "{}Thanks so much for your time today. The team will be in touch with next steps.",
                    interviewer_llm::CLOSING_PREFIX
                )
            },
        };

        let concluding = is_closing(&text);
        let spoken = strip_closing(&text);
        if let Err(e) = self.deps.speech.speak(&self.session_id, spoken).await {
            // Still wind the session down; the report matters more than
            // the goodbye audio
            tracing::warn!(session_id = %self.session_id, "closing speech failed: {}", e);
        }
        if concluding {
            if let Err(e) = self.deps.speech.announce_complete(&self.session_id).await {
                tracing::warn!(session_id = %self.session_id, "completion signal failed: {}", e);
            }
        }
        self.engine.utterance_spoken(spoken, true);

        tracing::info!(
            session_id = %self.session_id,
            turns = self.engine.state().turn,
            "interview concluded"
        );
        Ok(TurnOutcome::Concluded)
    }

    async fn speak_filler(&mut self) -> Result<TurnOutcome, AgentError> {
        let ended = self.deps.speech.speak(&self.session_id, FILLER_REPLY).await?;
        self.last_speech_ended = Some(ended);
        // The pending question stays in place; the candidate tries again
        Ok(TurnOutcome::Degraded)
    }

    /// Stop accepting recorder work and drain in-flight persistence.
    ///
    /// Must complete before the scorer reads the session's records.
    pub async fn shutdown(&self, drain_timeout: Duration) {
        self.deps.recorder.close();
        self.deps.recorder.drain(drain_timeout).await;
    }
}
