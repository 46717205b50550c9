//! Turn orchestration engine
//!
//! The stateful core of the interviewer:
//! - `orchestrator`: the turn/drill state machine and decision rules
//! - `runner`: the per-session driver wiring grading, synthesis and speech
//! - `recorder`: non-blocking background evidence persistence
//! - `scorer`: end-of-session aggregation into a final report
//! - `speech`: ordered, bracketed speech output to the session channel

pub mod orchestrator;
pub mod recorder;
pub mod runner;
pub mod scorer;
pub mod speech;

pub use orchestrator::{Decision, InterviewPhase, TurnEngine, TurnGate, TurnState};
pub use recorder::EvidenceRecorder;
pub use runner::{InterviewRuntime, RuntimeDeps, TurnOutcome};
pub use scorer::{FinalReport, Recommendation, ReportStatus, SessionScorer, TurnSummary};
pub use speech::{SpeechOutput, SpeechOutputPipeline};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Grading error: {0}")]
    Grading(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl From<AgentError> for interviewer_core::Error {
    fn from(err: AgentError) -> Self {
        interviewer_core::Error::Session(err.to_string())
    }
}
