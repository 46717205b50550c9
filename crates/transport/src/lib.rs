//! Pub/sub transport for the candidate-facing channel
//!
//! The interview server never talks to candidate browsers directly for
//! output; it publishes display text, speech events and audio chunks to a
//! channel server over its HTTP publish API. Candidates subscribe with a
//! short-lived signed token scoped to their session.

pub mod channel;
pub mod token;

pub use channel::{interview_channel, ChannelMessage, ChannelPublisher, SpeechEvent};
pub use token::issue_connection_token;

use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Token error: {0}")]
    Token(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<TransportError> for interviewer_core::Error {
    fn from(err: TransportError) -> Self {
        interviewer_core::Error::Transport(err.to_string())
    }
}
