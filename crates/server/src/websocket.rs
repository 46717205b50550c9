//! Candidate audio WebSocket
//!
//! Binary frames carry the candidate's PCM audio and are relayed straight
//! to the streaming recognizer. A `turn_complete` text frame is the
//! explicit end-of-answer signal: the accumulated transcript is handed to
//! the turn loop. Replies reach the candidate over the pub/sub channel,
//! not this socket.
//!
//! Teardown rules: STT relay and keepalive are cancelled on disconnect;
//! already-dispatched persistence tasks run to completion, but no new ones
//! are accepted.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use interviewer_agent::{
    EvidenceRecorder, InterviewRuntime, RuntimeDeps, SpeechOutputPipeline, TurnEngine, TurnOutcome,
};
use interviewer_core::InterviewStage;
use interviewer_llm::{AnswerGrader, PromptBuilder, ResponseSynthesizer};
use interviewer_pipeline::{SttEvent, SttStream, TranscriptBuffer};

use crate::session::SessionEntry;
use crate::state::AppState;

/// How long disconnect teardown waits for in-flight persistence
const DISCONNECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages the candidate client sends on this socket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// The candidate finished speaking their answer
    TurnComplete,
    Ping,
}

/// WebSocket handler
pub struct WebSocketHandler;

impl WebSocketHandler {
    /// Handle WebSocket upgrade
    pub async fn handle(
        ws: WebSocketUpgrade,
        State(state): State<AppState>,
        Path(session_id): Path<Uuid>,
    ) -> Result<Response, StatusCode> {
        let entry = state
            .sessions
            .get(&session_id)
            .ok_or(StatusCode::NOT_FOUND)?;

        Ok(ws.on_upgrade(move |socket| Self::handle_socket(socket, entry, state)))
    }

    async fn handle_socket(mut socket: WebSocket, entry: Arc<SessionEntry>, state: AppState) {
        let session_id = entry.id;
        let (stt_settings, keepalive, policy, tts_sample_rate) = {
            let config = state.config.read();
            (
                config.speech.stt.clone(),
                Duration::from_secs(config.speech.stt.keepalive_secs),
                config.interview.clone(),
                config.speech.tts.sample_rate,
            )
        };

        // A rejected STT handshake is fatal: close the session rather than
        // run half-initialized
        let (mut stt, mut stt_events) = match SttStream::connect(&stt_settings).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(session_id = %session_id, "STT handshake failed: {}", e);
                let _ = socket.send(Message::Close(None)).await;
                state.sessions.remove(&session_id);
                return;
            },
        };
        stt.spawn_keepalive(keepalive);

        // Ingestion task: finalized fragments flow into the shared buffer
        // while the turn loop reads by explicit hand-off below
        let buffer = Arc::new(TranscriptBuffer::new());
        let ingest_buffer = buffer.clone();
        let ingest_task = tokio::spawn(async move {
            while let Some(event) = stt_events.recv().await {
                match event {
                    SttEvent::Transcript { text, is_final } => {
                        if is_final {
                            ingest_buffer.push_final(&text);
                        }
                    },
                    SttEvent::UtteranceEnd | SttEvent::SpeechStarted => {},
                    SttEvent::Closed => break,
                }
            }
            tracing::debug!(session_id = %session_id, "STT ingestion task ended");
        });

        // Build the turn-loop runtime on first connect and speak the opener
        {
            let mut runtime = entry.runtime.lock().await;
            if runtime.is_none() {
                let (job_title, candidate_name, rubric) = {
                    let session = entry.session.read();
                    (
                        session.job_title.clone(),
                        session.candidate_name.clone(),
                        session.rubric.clone(),
                    )
                };
                let prompts =
                    PromptBuilder::new(job_title, candidate_name, rubric.clone(), policy.clone());
                let deps = RuntimeDeps {
                    grader: AnswerGrader::new(state.reasoning.clone(), prompts.clone()),
                    synthesizer: ResponseSynthesizer::new(state.reasoning.clone(), prompts),
                    speech: Arc::new(SpeechOutputPipeline::new(
                        state.tts.clone(),
                        state.publisher.clone(),
                        tts_sample_rate,
                    )),
                    recorder: Arc::new(EvidenceRecorder::new(
                        state.metrics.clone(),
                        state.evidence.clone(),
                        policy.pass_threshold,
                    )),
                };
                let mut new_runtime = InterviewRuntime::new(
                    session_id,
                    rubric,
                    TurnEngine::new(policy.clone()),
                    policy.history_window,
                    deps,
                );

                match new_runtime.open().await {
                    Ok(_) => {
                        entry
                            .session
                            .write()
                            .transition_to(InterviewStage::Technical);
                    },
                    Err(e) => {
                        tracing::error!(session_id = %session_id, "opening failed: {}", e);
                    },
                }
                *runtime = Some(new_runtime);
            }
        }

        // Main loop: audio in, turn signals in
        while let Some(message) = socket.recv().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!(session_id = %session_id, "socket error: {}", e);
                    break;
                },
            };
            entry.touch();

            match message {
                Message::Binary(pcm) => {
                    if let Err(e) = stt.send_audio(pcm).await {
                        tracing::warn!(session_id = %session_id, "audio relay failed: {}", e);
                        break;
                    }
                },
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::TurnComplete) => {
                        Self::run_turn(&entry, &buffer).await;
                    },
                    Ok(ClientMessage::Ping) => {},
                    Err(_) => {
                        tracing::debug!(session_id = %session_id, "unknown client message");
                    },
                },
                Message::Close(_) => break,
                _ => {},
            }
        }

        // Teardown: cancel relay and keepalive, let dispatched persistence
        // finish, accept nothing new
        if let Err(e) = stt.finish().await {
            tracing::debug!(session_id = %session_id, "STT finish failed: {}", e);
        }
        stt.abort();
        ingest_task.abort();

        {
            let runtime = entry.runtime.lock().await;
            if let Some(runtime) = runtime.as_ref() {
                runtime.shutdown(DISCONNECT_DRAIN_TIMEOUT).await;
            }
        }

        tracing::info!(session_id = %session_id, "WebSocket disconnected");
    }

    /// Hand the buffered utterance to the turn loop
    async fn run_turn(entry: &Arc<SessionEntry>, buffer: &Arc<TranscriptBuffer>) {
        let session_id = entry.id;
        let Some(utterance) = buffer.take() else {
            // Turn signal with nothing accumulated: log and keep waiting
            tracing::debug!(session_id = %session_id, "turn signal with empty buffer; waiting");
            return;
        };

        let mut runtime = entry.runtime.lock().await;
        let Some(runtime) = runtime.as_mut() else {
            tracing::warn!(session_id = %session_id, "turn signal before runtime init");
            return;
        };

        match runtime.handle_utterance(utterance).await {
            Ok(TurnOutcome::Concluded) => {
                entry
                    .session
                    .write()
                    .transition_to(InterviewStage::Completed);
            },
            Ok(outcome) => {
                tracing::debug!(session_id = %session_id, ?outcome, "turn processed");
            },
            Err(e) => {
                tracing::error!(session_id = %session_id, "turn failed: {}", e);
            },
        }
    }
}
