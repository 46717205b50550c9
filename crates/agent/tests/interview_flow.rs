//! End-to-end turn loop tests with mocked collaborators
//!
//! The reasoning backend replays canned judgments, speech output records
//! what would have been spoken, and the stores are in-memory, so these
//! tests exercise the full grade -> decide -> record -> synthesize -> speak
//! path without any network.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use interviewer_agent::{
    EvidenceRecorder, InterviewRuntime, RuntimeDeps, SessionScorer, SpeechOutput, TurnEngine,
    TurnOutcome,
};
use interviewer_config::InterviewConfig;
use interviewer_core::{Directive, Rubric};
use interviewer_llm::{
    AnswerGrader, LlmError, PromptBuilder, ReasoningBackend, ReasoningRequest, ResponseSynthesizer,
};
use interviewer_persistence::{
    EvidenceStore, InMemoryEvidenceStore, InMemoryMetricStore, MetricStore,
};
use interviewer_pipeline::Utterance;

/// Replays queued judgments for grading calls; answers synthesis calls
/// with a fixed spoken line.
struct MockReasoning {
    judgments: Mutex<VecDeque<serde_json::Value>>,
}

impl MockReasoning {
    fn new(judgments: Vec<serde_json::Value>) -> Self {
        Self {
            judgments: Mutex::new(judgments.into()),
        }
    }
}

#[async_trait]
impl ReasoningBackend for MockReasoning {
    async fn generate(&self, _request: &ReasoningRequest) -> Result<String, LlmError> {
        Ok("Good to know. How would you approach that in production?".to_string())
    }

    async fn generate_json(
        &self,
        _request: &ReasoningRequest,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        self.judgments
            .lock()
            .pop_front()
            .ok_or_else(|| LlmError::Generation("no queued judgment".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Backend whose grading calls always fail
struct FailingReasoning;

#[async_trait]
impl ReasoningBackend for FailingReasoning {
    async fn generate(&self, _request: &ReasoningRequest) -> Result<String, LlmError> {
        Err(LlmError::Timeout)
    }

    async fn generate_json(
        &self,
        _request: &ReasoningRequest,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        Err(LlmError::Timeout)
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Records spoken utterances instead of synthesizing audio
#[derive(Default)]
struct RecordingSpeech {
    utterances: Mutex<Vec<String>>,
    completions: Mutex<u32>,
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn speak(
        &self,
        _session_id: &Uuid,
        text: &str,
    ) -> Result<Instant, interviewer_agent::AgentError> {
        self.utterances.lock().push(text.to_string());
        Ok(Instant::now())
    }

    async fn announce_complete(
        &self,
        _session_id: &Uuid,
    ) -> Result<(), interviewer_agent::AgentError> {
        *self.completions.lock() += 1;
        Ok(())
    }
}

fn rubric() -> Rubric {
    Rubric {
        languages: vec!["Rust".to_string()],
        experience_level: "Senior".to_string(),
        core_skills: vec![
            "Async Runtimes".to_string(),
            "Ownership".to_string(),
            "Unsafe Code".to_string(),
        ],
        evaluation_focus: vec!["Technical Depth".to_string()],
    }
}

fn judgment_json(score: u8) -> serde_json::Value {
    serde_json::json!({
        "understanding_score": score,
        "explainability_score": score,
        "evidence": format!("quote scoring {}", score),
        "critique": "fine",
        "ideal_answer": "more depth",
        "missed_concepts": ["work stealing"],
        "is_cheating_suspected": false,
        "is_off_topic": false,
        "needs_clarification": false,
        "bias_flag": false
    })
}

struct Harness {
    runtime: InterviewRuntime,
    speech: Arc<RecordingSpeech>,
    metrics: Arc<InMemoryMetricStore>,
    evidence: Arc<InMemoryEvidenceStore>,
    session_id: Uuid,
}

fn harness(backend: Arc<dyn ReasoningBackend>) -> Harness {
    let session_id = Uuid::new_v4();
    let policy = InterviewConfig::default();
    let prompts = PromptBuilder::new("Rust Engineer", "Ada", rubric(), policy.clone());

    let metrics = Arc::new(InMemoryMetricStore::new());
    let evidence = Arc::new(InMemoryEvidenceStore::new());
    let recorder = Arc::new(EvidenceRecorder::new(
        metrics.clone(),
        evidence.clone(),
        policy.pass_threshold,
    ));
    let speech = Arc::new(RecordingSpeech::default());

    let deps = RuntimeDeps {
        grader: AnswerGrader::new(backend.clone(), prompts.clone()),
        synthesizer: ResponseSynthesizer::new(backend, prompts),
        speech: speech.clone(),
        recorder,
    };

    Harness {
        runtime: InterviewRuntime::new(
            session_id,
            rubric(),
            TurnEngine::new(policy.clone()),
            policy.history_window,
            deps,
        ),
        speech,
        metrics,
        evidence,
        session_id,
    }
}

fn utterance(text: &str) -> Utterance {
    Utterance {
        text: text.to_string(),
        first_fragment_at: Instant::now(),
    }
}

#[tokio::test]
async fn test_drill_walk_records_evidence_for_passing_turns() {
    // Scores [9, 9, 6]: deepen after turn 1, pivot after turn 2 (drill cap),
    // pivot after turn 3. Evidence snippets for the two passing turns only.
    let backend = Arc::new(MockReasoning::new(vec![
        judgment_json(9),
        judgment_json(9),
        judgment_json(6),
    ]));
    let mut h = harness(backend);

    let opening = h.runtime.open().await.unwrap();
    assert!(opening.ends_with('?'));

    let o1 = h.runtime.handle_utterance(utterance("answer one")).await.unwrap();
    assert_eq!(o1, TurnOutcome::Spoken { directive: Directive::Deepen });
    assert_eq!(h.runtime.drill_depth(), 1);

    let o2 = h.runtime.handle_utterance(utterance("answer two")).await.unwrap();
    assert_eq!(o2, TurnOutcome::Spoken { directive: Directive::Pivot });
    assert_eq!(h.runtime.drill_depth(), 0);

    let o3 = h.runtime.handle_utterance(utterance("answer three")).await.unwrap();
    assert_eq!(o3, TurnOutcome::Spoken { directive: Directive::Pivot });
    assert_eq!(h.runtime.drill_depth(), 0);
    assert_eq!(h.runtime.turn_count(), 3);

    h.runtime.shutdown(Duration::from_secs(1)).await;

    let records = h.metrics.list_for_session(&h.session_id).await.unwrap();
    assert_eq!(records.len(), 3);

    let snippets = h.evidence.list_for_session(&h.session_id).await.unwrap();
    assert_eq!(snippets.len(), 2);
    assert!(snippets.iter().all(|s| s.score == 9));
    // Both strong answers were on the opening topic
    assert_eq!(snippets[0].skill, "Async Runtimes");
}

#[tokio::test]
async fn test_clarification_does_not_charge_turn() {
    let mut clarify = judgment_json(0);
    clarify["needs_clarification"] = serde_json::Value::Bool(true);

    let backend = Arc::new(MockReasoning::new(vec![
        judgment_json(6),
        judgment_json(6),
        clarify,
    ]));
    let mut h = harness(backend);

    h.runtime.open().await.unwrap();
    h.runtime.handle_utterance(utterance("a1")).await.unwrap();
    h.runtime.handle_utterance(utterance("a2")).await.unwrap();
    assert_eq!(h.runtime.turn_count(), 2);

    let outcome = h.runtime.handle_utterance(utterance("sorry, what?")).await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Spoken { directive: Directive::Rephrase }
    );
    assert_eq!(h.runtime.turn_count(), 2);
}

#[tokio::test]
async fn test_off_topic_redirects_and_resets_drill() {
    let mut off_topic = judgment_json(9);
    off_topic["is_off_topic"] = serde_json::Value::Bool(true);

    let backend = Arc::new(MockReasoning::new(vec![judgment_json(9), off_topic]));
    let mut h = harness(backend);

    h.runtime.open().await.unwrap();
    h.runtime.handle_utterance(utterance("solid answer")).await.unwrap();
    assert_eq!(h.runtime.drill_depth(), 1);

    let outcome = h
        .runtime
        .handle_utterance(utterance("my favourite football team"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Spoken { directive: Directive::Redirect }
    );
    assert_eq!(h.runtime.drill_depth(), 0);

    h.runtime.shutdown(Duration::from_secs(1)).await;
    let records = h.metrics.list_for_session(&h.session_id).await.unwrap();
    // Off-topic judgment was persisted with its score forced to zero
    assert_eq!(records.last().unwrap().understanding_score, 0);
}

#[tokio::test]
async fn test_budget_exhaustion_concludes_and_announces() {
    let backend = Arc::new(MockReasoning::new(
        (0..6).map(|_| judgment_json(6)).collect(),
    ));
    let mut h = harness(backend);

    h.runtime.open().await.unwrap();
    for i in 0..6 {
        let outcome = h
            .runtime
            .handle_utterance(utterance(&format!("answer {}", i)))
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Spoken { .. }));
    }
    assert_eq!(h.runtime.turn_count(), 6);

    // Seventh utterance short-circuits grading entirely
    let outcome = h.runtime.handle_utterance(utterance("one more")).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Concluded);
    assert!(h.runtime.is_finished());
    assert_eq!(*h.speech.completions.lock(), 1);

    // Finished is absorbing
    let outcome = h.runtime.handle_utterance(utterance("hello?")).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Ignored);

    // The closing line was spoken without the sentinel and without a question
    let utterances = h.speech.utterances.lock();
    let closing = utterances.last().unwrap();
    assert!(!closing.contains("[[closing]]"));
    assert!(!closing.ends_with('?'));
}

#[tokio::test]
async fn test_backend_failure_degrades_to_filler() {
    let mut h = harness(Arc::new(FailingReasoning));

    // Opening falls back to a built-in question mentioning the first skill
    let opening = h.runtime.open().await.unwrap();
    assert!(opening.contains("Async Runtimes"));

    let outcome = h.runtime.handle_utterance(utterance("an answer")).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Degraded);
    // The failed exchange still counts against the budget
    assert_eq!(h.runtime.turn_count(), 1);
    // The pending question is unchanged
    assert_eq!(h.runtime.last_question(), opening);

    let utterances = h.speech.utterances.lock();
    assert_eq!(utterances.last().unwrap(), "Could you elaborate on that?");
}

#[tokio::test]
async fn test_full_session_scores_hire() {
    // Six graded turns averaging 7.5 -> overall 75 -> HIRE
    let backend = Arc::new(MockReasoning::new(
        [8, 7, 8, 7, 8, 7].iter().map(|&s| judgment_json(s)).collect(),
    ));
    let mut h = harness(backend);

    h.runtime.open().await.unwrap();
    for i in 0..6 {
        h.runtime
            .handle_utterance(utterance(&format!("answer {}", i)))
            .await
            .unwrap();
    }
    h.runtime.handle_utterance(utterance("done")).await.unwrap();
    h.runtime.shutdown(Duration::from_secs(1)).await;

    let records = h.metrics.list_for_session(&h.session_id).await.unwrap();
    let report = SessionScorer::score(&records);
    assert_eq!(report.overall_score, 75);
    assert_eq!(
        report.recommendation,
        Some(interviewer_agent::Recommendation::Hire)
    );
    assert_eq!(report.timeline.len(), 6);
    // Weaknesses deduplicate across turns
    assert_eq!(report.top_weaknesses, vec!["work stealing"]);
}
