//! Crate-spanning error type

use thiserror::Error;

/// Top-level error for the voice interviewer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reasoning engine error: {0}")]
    Reasoning(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, Error>;
