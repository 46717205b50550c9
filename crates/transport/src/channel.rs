//! Channel publishing
//!
//! Publishes messages to the channel server's HTTP API. One channel per
//! session, named `{namespace}:interview:{session_id}`. Audio is base64
//! encoded with a per-utterance sequence number so the receiver can detect
//! loss or reordering.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use interviewer_config::ChannelConfig;

use crate::TransportError;

/// Channel name for a session
pub fn interview_channel(namespace: &str, session_id: &Uuid) -> String {
    format!("{}:interview:{}", namespace, session_id)
}

/// Speech bracket events observed by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEvent {
    SpeechStart,
    SpeechEnd,
}

impl SpeechEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechEvent::SpeechStart => "speech_start",
            SpeechEvent::SpeechEnd => "speech_end",
        }
    }
}

/// Messages published on an interview channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// Display text for the visual transcript
    TextMessage { message: String, sender: String },
    /// Speech bracket event
    Event {
        event: String,
        #[serde(default)]
        data: serde_json::Value,
    },
    /// One ordered audio chunk of the current utterance
    TtsAudio {
        /// Base64 PCM16 payload
        audio: String,
        format: String,
        sample_rate: u32,
        channels: u8,
        sequence: u32,
    },
    /// Session-end signal, no payload
    InterviewComplete,
}

/// HTTP client for the channel server's publish API
#[derive(Clone)]
pub struct ChannelPublisher {
    client: Client,
    config: ChannelConfig,
}

impl ChannelPublisher {
    pub fn new(config: ChannelConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Publish(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Namespace this publisher is scoped to
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Publish one message to a session's channel
    pub async fn publish(
        &self,
        session_id: &Uuid,
        message: &ChannelMessage,
    ) -> Result<(), TransportError> {
        let channel = interview_channel(&self.config.namespace, session_id);
        let payload = json!({
            "method": "publish",
            "params": {
                "channel": channel,
                "data": message,
            }
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("apikey {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Publish(format!("{}: {}", status, detail)));
        }

        Ok(())
    }

    /// Publish display text
    pub async fn publish_text_message(
        &self,
        session_id: &Uuid,
        message: &str,
        sender: &str,
    ) -> Result<(), TransportError> {
        self.publish(
            session_id,
            &ChannelMessage::TextMessage {
                message: message.to_string(),
                sender: sender.to_string(),
            },
        )
        .await
    }

    /// Publish a speech bracket event
    pub async fn publish_event(
        &self,
        session_id: &Uuid,
        event: SpeechEvent,
    ) -> Result<(), TransportError> {
        self.publish(
            session_id,
            &ChannelMessage::Event {
                event: event.as_str().to_string(),
                data: serde_json::Value::Object(Default::default()),
            },
        )
        .await
    }

    /// Publish one ordered audio chunk
    pub async fn publish_audio_chunk(
        &self,
        session_id: &Uuid,
        chunk: &[u8],
        sample_rate: u32,
        sequence: u32,
    ) -> Result<(), TransportError> {
        self.publish(
            session_id,
            &ChannelMessage::TtsAudio {
                audio: BASE64.encode(chunk),
                format: "pcm16".to_string(),
                sample_rate,
                channels: 1,
                sequence,
            },
        )
        .await
    }

    /// Publish the session-end signal
    pub async fn publish_interview_complete(&self, session_id: &Uuid) -> Result<(), TransportError> {
        self.publish(session_id, &ChannelMessage::InterviewComplete)
            .await
    }
}
