//! Streaming speech-to-text channel
//!
//! Connects to the recognizer's WebSocket, forwards binary PCM frames, and
//! fans recognition events out over an mpsc channel. A periodic keepalive
//! text frame prevents idle-timeout disconnection while the reasoning
//! pipeline is thinking; the keepalive task terminates silently once the
//! underlying connection closes.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use interviewer_config::SttSettings;

use crate::PipelineError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Recognition events delivered to the session driver
#[derive(Debug, Clone)]
pub enum SttEvent {
    /// Transcript fragment; only `is_final` fragments belong in the buffer
    Transcript { text: String, is_final: bool },
    /// Recognizer detected the end of a spoken utterance
    UtteranceEnd,
    /// Recognizer detected speech onset
    SpeechStarted,
    /// Connection closed (remote close or read error)
    Closed,
}

/// Live streaming connection to the recognizer
pub struct SttStream {
    sink: Arc<Mutex<WsSink>>,
    reader_task: JoinHandle<()>,
    keepalive_task: Option<JoinHandle<()>>,
}

impl SttStream {
    /// Open the streaming channel.
    ///
    /// The handshake is explicit: an `Err` here means the session must be
    /// closed rather than continue half-initialized. On success the caller
    /// receives the stream handle plus the event receiver.
    pub async fn connect(
        settings: &SttSettings,
    ) -> Result<(Self, mpsc::Receiver<SttEvent>), PipelineError> {
        let mut request = build_url(settings)
            .into_client_request()
            .map_err(|e| PipelineError::Connection(format!("invalid STT URL: {}", e)))?;

        if let Some(key) = &settings.api_key {
            let value = format!("Token {}", key)
                .parse()
                .map_err(|_| PipelineError::Connection("invalid API key header".to_string()))?;
            request.headers_mut().insert("Authorization", value);
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| PipelineError::Handshake(e.to_string()))?;

        tracing::info!(endpoint = %settings.endpoint, model = %settings.model, "STT channel connected");

        let (sink, source) = ws_stream.split();
        let (event_tx, event_rx) = mpsc::channel(64);
        let reader_task = tokio::spawn(read_events(source, event_tx));

        Ok((
            Self {
                sink: Arc::new(Mutex::new(sink)),
                reader_task,
                keepalive_task: None,
            },
            event_rx,
        ))
    }

    /// Forward one binary PCM frame to the recognizer
    pub async fn send_audio(&self, frame: Vec<u8>) -> Result<(), PipelineError> {
        self.sink
            .lock()
            .await
            .send(Message::Binary(frame))
            .await
            .map_err(|e| PipelineError::Stream(e.to_string()))
    }

    /// Start the keepalive task.
    ///
    /// Runs for the lifetime of the session and exits silently the first
    /// time a ping fails to send (the connection is gone).
    pub fn spawn_keepalive(&mut self, every: Duration) {
        let sink = self.sink.clone();
        self.keepalive_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so the ping cadence
            // starts one interval after connect
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let frame = Message::Text(r#"{"type":"KeepAlive"}"#.to_string());
                if sink.lock().await.send(frame).await.is_err() {
                    tracing::debug!("STT keepalive stopping: connection closed");
                    break;
                }
            }
        }));
    }

    /// Tell the recognizer no more audio is coming, then close
    pub async fn finish(&self) -> Result<(), PipelineError> {
        let mut sink = self.sink.lock().await;
        let frame = Message::Text(r#"{"type":"CloseStream"}"#.to_string());
        sink.send(frame)
            .await
            .map_err(|e| PipelineError::Stream(e.to_string()))?;
        sink.close()
            .await
            .map_err(|e| PipelineError::Stream(e.to_string()))
    }

    /// Cancel the reader and keepalive tasks (session disconnect path)
    pub fn abort(&self) {
        self.reader_task.abort();
        if let Some(task) = &self.keepalive_task {
            task.abort();
        }
    }
}

impl Drop for SttStream {
    fn drop(&mut self) {
        self.abort();
    }
}

fn build_url(settings: &SttSettings) -> String {
    format!(
        "{}?model={}&language={}&encoding=linear16&sample_rate={}&channels=1&interim_results=true&punctuate=true",
        settings.endpoint, settings.model, settings.language, settings.sample_rate
    )
}

async fn read_events(mut source: WsSource, events: mpsc::Sender<SttEvent>) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(event) = parse_event(&text) {
                    if events.send(event).await.is_err() {
                        // Receiver dropped; session is tearing down
                        return;
                    }
                }
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {},
        }
    }
    let _ = events.send(SttEvent::Closed).await;
    tracing::debug!("STT reader task ended");
}

fn parse_event(text: &str) -> Option<SttEvent> {
    let response: RecognizerResponse = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("unparseable STT event: {}", e);
            return None;
        },
    };

    match response.kind.as_str() {
        "Results" => {
            let transcript = response
                .channel?
                .alternatives
                .into_iter()
                .next()
                .map(|a| a.transcript)?;
            if transcript.trim().is_empty() {
                return None;
            }
            Some(SttEvent::Transcript {
                text: transcript,
                is_final: response.is_final,
            })
        },
        "UtteranceEnd" => Some(SttEvent::UtteranceEnd),
        "SpeechStarted" => Some(SttEvent::SpeechStarted),
        _ => None,
    }
}

// Recognizer wire format

#[derive(Debug, Deserialize)]
struct RecognizerResponse {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    channel: Option<RecognizerChannel>,
    #[serde(default)]
    is_final: bool,
}

#[derive(Debug, Deserialize)]
struct RecognizerChannel {
    #[serde(default)]
    alternatives: Vec<RecognizerAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizerAlternative {
    #[serde(default)]
    transcript: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_transcript() {
        let raw = r#"{
            "type": "Results",
            "is_final": true,
            "channel": {"alternatives": [{"transcript": "borrow checker", "confidence": 0.98}]}
        }"#;
        match parse_event(raw) {
            Some(SttEvent::Transcript { text, is_final }) => {
                assert_eq!(text, "borrow checker");
                assert!(is_final);
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_empty_transcript_dropped() {
        let raw = r#"{"type": "Results", "is_final": false, "channel": {"alternatives": [{"transcript": "  "}]}}"#;
        assert!(parse_event(raw).is_none());
    }

    #[test]
    fn test_utterance_end() {
        let raw = r#"{"type": "UtteranceEnd", "last_word_end": 3.1}"#;
        assert!(matches!(parse_event(raw), Some(SttEvent::UtteranceEnd)));
    }

    #[test]
    fn test_unknown_event_ignored() {
        assert!(parse_event(r#"{"type": "Metadata"}"#).is_none());
    }

    #[test]
    fn test_url_carries_audio_params() {
        let settings = SttSettings::default();
        let url = build_url(&settings);
        assert!(url.contains("sample_rate=16000"));
        assert!(url.contains("interim_results=true"));
    }
}
