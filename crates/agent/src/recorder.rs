//! Background evidence recording
//!
//! Persisting a graded turn must never delay the next spoken reply, so each
//! record is dispatched as a tracked background task. Failures are logged
//! and swallowed; they never reach the conversational path. At teardown the
//! session supervisor closes the recorder (no new dispatches) and drains
//! the in-flight tasks with a bounded timeout, since already-dispatched
//! writes run to completion even after a disconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use interviewer_persistence::{
    AnswerMetricRecord, EvidenceSnippet, EvidenceStore, MetricStore,
};

/// Persists grading output concurrently with conversation flow
pub struct EvidenceRecorder {
    metrics: Arc<dyn MetricStore>,
    evidence: Arc<dyn EvidenceStore>,
    pass_threshold: u8,
    tasks: Mutex<JoinSet<()>>,
    accepting: AtomicBool,
}

impl EvidenceRecorder {
    pub fn new(
        metrics: Arc<dyn MetricStore>,
        evidence: Arc<dyn EvidenceStore>,
        pass_threshold: u8,
    ) -> Self {
        Self {
            metrics,
            evidence,
            pass_threshold,
            tasks: Mutex::new(JoinSet::new()),
            accepting: AtomicBool::new(true),
        }
    }

    /// Dispatch persistence of one graded turn without blocking.
    ///
    /// An evidence snippet is written only when the understanding score
    /// reaches the passing threshold; `skill` names the rubric skill the
    /// answer addressed.
    pub fn dispatch(&self, record: AnswerMetricRecord, skill: &str) {
        if !self.accepting.load(Ordering::Acquire) {
            tracing::warn!(
                session_id = %record.session_id,
                "recorder closed; dropping metric record"
            );
            return;
        }

        let snippet = (record.understanding_score >= self.pass_threshold
            && !record.evidence.is_empty())
        .then(|| {
            EvidenceSnippet::new(
                record.session_id,
                skill,
                record.evidence.clone(),
                record.understanding_score,
            )
        });

        let metrics = self.metrics.clone();
        let evidence = self.evidence.clone();

        self.tasks.lock().spawn(async move {
            if let Err(e) = metrics.record(&record).await {
                tracing::warn!(
                    session_id = %record.session_id,
                    "failed to persist metric record: {}",
                    e
                );
            }
            if let Some(snippet) = snippet {
                if let Err(e) = evidence.record(&snippet).await {
                    tracing::warn!(
                        session_id = %snippet.session_id,
                        "failed to persist evidence snippet: {}",
                        e
                    );
                }
            }
        });
    }

    /// Stop accepting new dispatches (session disconnect)
    pub fn close(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    /// Number of in-flight persistence tasks
    pub fn in_flight(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Await all dispatched tasks, bounded by `timeout`.
    ///
    /// Must run before the scorer aggregates: persistence of turn N may
    /// still be racing with later turns until this returns.
    pub async fn drain(&self, timeout: Duration) {
        let mut tasks = { std::mem::take(&mut *self.tasks.lock()) };
        if tasks.is_empty() {
            return;
        }

        let drained = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "recorder drain timed out; abandoning remaining tasks"
            );
            tasks.abort_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::AnswerJudgment;
    use interviewer_persistence::{InMemoryEvidenceStore, InMemoryMetricStore};
    use uuid::Uuid;

    fn recorder() -> (Arc<InMemoryMetricStore>, Arc<InMemoryEvidenceStore>, EvidenceRecorder) {
        let metrics = Arc::new(InMemoryMetricStore::new());
        let evidence = Arc::new(InMemoryEvidenceStore::new());
        let recorder = EvidenceRecorder::new(metrics.clone(), evidence.clone(), 7);
        (metrics, evidence, recorder)
    }

    fn record(session_id: Uuid, score: u8) -> AnswerMetricRecord {
        let judgment = AnswerJudgment {
            understanding_score: score,
            evidence: "a direct quote".to_string(),
            ..Default::default()
        };
        AnswerMetricRecord::from_judgment(session_id, "q", "a", &judgment)
    }

    #[tokio::test]
    async fn test_passing_score_records_evidence() {
        let (metrics, evidence, recorder) = recorder();
        let session = Uuid::new_v4();

        recorder.dispatch(record(session, 9), "Ownership");
        recorder.dispatch(record(session, 6), "Lifetimes");
        recorder.drain(Duration::from_secs(1)).await;

        assert_eq!(metrics.list_for_session(&session).await.unwrap().len(), 2);
        let snippets = evidence.list_for_session(&session).await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].skill, "Ownership");
        assert_eq!(snippets[0].score, 9);
    }

    #[tokio::test]
    async fn test_closed_recorder_drops_dispatches() {
        let (metrics, _, recorder) = recorder();
        let session = Uuid::new_v4();

        recorder.close();
        recorder.dispatch(record(session, 9), "Ownership");
        recorder.drain(Duration::from_secs(1)).await;

        assert!(metrics.list_for_session(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_on_empty_recorder_returns() {
        let (_, _, recorder) = recorder();
        recorder.drain(Duration::from_millis(10)).await;
        assert_eq!(recorder.in_flight(), 0);
    }
}
