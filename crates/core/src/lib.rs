//! Core types for the voice interviewer
//!
//! This crate provides foundational types used across all other crates:
//! - Rubric and job posting definitions
//! - Interview session and stage types
//! - Structured answer judgments
//! - Conversational directives and turn history
//! - Error types

pub mod error;
pub mod judgment;
pub mod rubric;
pub mod session;
pub mod turn;

pub use error::{Error, Result};
pub use judgment::AnswerJudgment;
pub use rubric::{JobPosting, Rubric};
pub use session::{InterviewSession, InterviewStage};
pub use turn::{Directive, HistoryWindow, TurnRecord};
