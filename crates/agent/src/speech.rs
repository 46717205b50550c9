//! Speech output pipeline
//!
//! Speaking one utterance is a bracketed sequence on the session channel:
//! display text, `speech_start`, ordered audio chunks, `speech_end`. The
//! sequence number restarts at zero per utterance so the receiver can
//! detect loss or reordering within it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use uuid::Uuid;

use interviewer_pipeline::SpeechSynthesizer;
use interviewer_transport::{ChannelPublisher, SpeechEvent};

use crate::AgentError;

/// Output seam for spoken replies
///
/// The runtime depends on this trait so tests can capture utterances
/// without a TTS engine or channel server.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak one utterance; returns the completion instant used to measure
    /// the candidate's response gap
    async fn speak(&self, session_id: &Uuid, text: &str) -> Result<Instant, AgentError>;

    /// Signal that the interview is complete
    async fn announce_complete(&self, session_id: &Uuid) -> Result<(), AgentError>;
}

/// Production speech output: TTS synthesis streamed over the channel
pub struct SpeechOutputPipeline {
    tts: Arc<SpeechSynthesizer>,
    publisher: Arc<ChannelPublisher>,
    sample_rate: u32,
}

impl SpeechOutputPipeline {
    pub fn new(tts: Arc<SpeechSynthesizer>, publisher: Arc<ChannelPublisher>, sample_rate: u32) -> Self {
        Self {
            tts,
            publisher,
            sample_rate,
        }
    }
}

#[async_trait]
impl SpeechOutput for SpeechOutputPipeline {
    async fn speak(&self, session_id: &Uuid, text: &str) -> Result<Instant, AgentError> {
        self.publisher
            .publish_text_message(session_id, text, "interviewer")
            .await
            .map_err(|e| AgentError::Speech(e.to_string()))?;

        self.publisher
            .publish_event(session_id, SpeechEvent::SpeechStart)
            .await
            .map_err(|e| AgentError::Speech(e.to_string()))?;

        let audio = self
            .tts
            .synthesize(text)
            .await
            .map_err(|e| AgentError::Speech(e.to_string()))?;

        for (sequence, chunk) in self.tts.chunks(&audio).enumerate() {
            self.publisher
                .publish_audio_chunk(session_id, chunk, self.sample_rate, sequence as u32)
                .await
                .map_err(|e| AgentError::Speech(e.to_string()))?;
        }

        self.publisher
            .publish_event(session_id, SpeechEvent::SpeechEnd)
            .await
            .map_err(|e| AgentError::Speech(e.to_string()))?;

        tracing::debug!(session_id = %session_id, chars = text.len(), "utterance spoken");
        Ok(Instant::now())
    }

    async fn announce_complete(&self, session_id: &Uuid) -> Result<(), AgentError> {
        self.publisher
            .publish_interview_complete(session_id)
            .await
            .map_err(|e| AgentError::Speech(e.to_string()))
    }
}
