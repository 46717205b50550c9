//! Application state
//!
//! Shared service handles across all handlers. Every external service is
//! constructed once at startup and injected here; nothing initializes
//! lazily on first use.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use interviewer_config::Settings;
use interviewer_core::JobPosting;
use interviewer_llm::ReasoningBackend;
use interviewer_persistence::{EvidenceStore, MetricStore};
use interviewer_pipeline::SpeechSynthesizer;
use interviewer_transport::ChannelPublisher;

use crate::session::SessionManager;

/// In-memory registry of job postings
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, JobPosting>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: JobPosting) -> Uuid {
        let id = job.id;
        self.jobs.write().insert(id, job);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<JobPosting> {
        self.jobs.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<JobPosting> {
        let mut jobs: Vec<_> = self.jobs.read().values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped for shared read access
    pub config: Arc<RwLock<Settings>>,
    /// Job postings
    pub jobs: Arc<JobRegistry>,
    /// Live interview sessions
    pub sessions: Arc<SessionManager>,
    /// Reasoning engine handle
    pub reasoning: Arc<dyn ReasoningBackend>,
    /// TTS engine handle
    pub tts: Arc<SpeechSynthesizer>,
    /// Channel publisher
    pub publisher: Arc<ChannelPublisher>,
    /// Metric record store
    pub metrics: Arc<dyn MetricStore>,
    /// Evidence snippet store
    pub evidence: Arc<dyn EvidenceStore>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Settings,
        reasoning: Arc<dyn ReasoningBackend>,
        tts: Arc<SpeechSynthesizer>,
        publisher: Arc<ChannelPublisher>,
        metrics: Arc<dyn MetricStore>,
        evidence: Arc<dyn EvidenceStore>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            jobs: Arc::new(JobRegistry::new()),
            sessions: Arc::new(SessionManager::new(100)),
            reasoning,
            tts,
            publisher,
            metrics,
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::Rubric;

    #[test]
    fn test_job_registry_roundtrip() {
        let registry = JobRegistry::new();
        let rubric = Rubric {
            languages: vec!["Rust".to_string()],
            experience_level: "Senior".to_string(),
            core_skills: vec!["Ownership".to_string()],
            evaluation_focus: vec![],
        };
        let job = JobPosting::new("Rust Engineer", vec!["Rust".to_string()], rubric);
        let id = registry.insert(job);

        assert!(registry.get(&id).is_some());
        assert_eq!(registry.list().len(), 1);
        assert!(registry.get(&Uuid::new_v4()).is_none());
    }
}
