//! Text-to-speech synthesis
//!
//! One `SpeechSynthesizer` is constructed per process and passed by
//! reference into the speech output pipeline; there is no implicit
//! first-use initialization. Synthesis returns the full utterance audio;
//! the caller slices it into ordered chunks for streaming.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use interviewer_config::TtsSettings;

use crate::PipelineError;

/// Handle to the TTS engine
pub struct SpeechSynthesizer {
    client: Client,
    settings: TtsSettings,
}

impl SpeechSynthesizer {
    /// Create the engine handle. Explicit init; fails fast on a bad client.
    pub fn new(settings: TtsSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Synthesis(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    /// Synthesize one utterance to PCM audio
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, PipelineError> {
        let url = format!(
            "{}?model={}&encoding={}&sample_rate={}",
            self.settings.endpoint, self.settings.voice, self.settings.encoding, self.settings.sample_rate
        );

        let mut request = self.client.post(&url).json(&json!({ "text": text }));
        if let Some(key) = &self.settings.api_key {
            request = request.header("Authorization", format!("Token {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesis(format!("{}: {}", status, detail)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Synthesis(e.to_string()))?
            .to_vec();

        tracing::debug!(bytes = audio.len(), voice = %self.settings.voice, "utterance synthesized");
        Ok(audio)
    }

    /// Slice utterance audio into fixed-size chunks for ordered streaming
    pub fn chunks<'a>(&self, audio: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        audio.chunks(self.settings.chunk_bytes.max(1))
    }

    /// Voice model in use
    pub fn voice(&self) -> &str {
        &self.settings.voice
    }

    /// Release the engine handle. The HTTP pool closes on drop; this exists
    /// so teardown is explicit at the call site.
    pub fn shutdown(self) {
        tracing::info!(voice = %self.settings.voice, "TTS engine handle released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_covers_all_bytes_in_order() {
        let mut settings = TtsSettings::default();
        settings.chunk_bytes = 4;
        let synth = SpeechSynthesizer::new(settings).unwrap();

        let audio: Vec<u8> = (0..10).collect();
        let chunks: Vec<&[u8]> = synth.chunks(&audio).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], &[0, 1, 2, 3]);
        assert_eq!(chunks[2], &[8, 9]);
    }

    #[test]
    fn test_zero_chunk_size_does_not_panic() {
        let mut settings = TtsSettings::default();
        settings.chunk_bytes = 0;
        let synth = SpeechSynthesizer::new(settings).unwrap();
        let audio = vec![1u8, 2, 3];
        assert_eq!(synth.chunks(&audio).count(), 3);
    }
}
