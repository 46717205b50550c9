//! Streaming audio relay
//!
//! - `transcript`: accumulates finalized STT fragments into one utterance
//! - `stt`: streaming speech-to-text channel with keepalive
//! - `tts`: text-to-speech handle with explicit lifecycle

pub mod stt;
pub mod transcript;
pub mod tts;

pub use stt::{SttEvent, SttStream};
pub use transcript::{TranscriptBuffer, Utterance};
pub use tts::SpeechSynthesizer;

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Handshake rejected: {0}")]
    Handshake(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Channel closed")]
    Closed,
}

impl From<PipelineError> for interviewer_core::Error {
    fn from(err: PipelineError) -> Self {
        interviewer_core::Error::Speech(err.to_string())
    }
}
