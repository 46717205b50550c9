//! Session management
//!
//! Tracks live interview sessions. Each entry holds the session record plus
//! the turn-loop runtime once the candidate's WebSocket connects. Expired
//! sessions are swept by a periodic cleanup task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use interviewer_agent::InterviewRuntime;
use interviewer_core::{InterviewSession, InterviewStage, JobPosting};

use crate::ServerError;

/// One tracked session
pub struct SessionEntry {
    pub id: Uuid,
    /// Session record; mutated by the turn loop and the end-of-session path
    pub session: RwLock<InterviewSession>,
    /// Turn-loop runtime, present once the candidate connects
    pub runtime: Mutex<Option<InterviewRuntime>>,
    pub created_at: Instant,
    pub last_activity: RwLock<Instant>,
}

impl SessionEntry {
    fn new(session: InterviewSession) -> Self {
        Self {
            id: session.id,
            session: RwLock::new(session),
            runtime: Mutex::new(None),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn is_completed(&self) -> bool {
        self.session.read().is_completed
    }

    /// Mark the session completed with its final score
    pub fn complete(&self, overall_score: u32) {
        let mut session = self.session.write();
        session.transition_to(InterviewStage::Completed);
        session.overall_score = Some(overall_score);
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
        }
    }

    /// Start a background task that periodically sweeps expired sessions.
    ///
    /// Returns a shutdown sender used to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                before - after,
                                after
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a session for a job posting
    pub fn create(
        &self,
        job: &JobPosting,
        candidate_name: &str,
    ) -> Result<Arc<SessionEntry>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Session("Max sessions reached".to_string()));
            }
        }

        let session = InterviewSession::new(job.id, &job.title, candidate_name, job.rubric.clone());
        let entry = Arc::new(SessionEntry::new(session));
        sessions.insert(entry.id, entry.clone());

        tracing::info!(session_id = %entry.id, job = %job.title, "Created session");
        Ok(entry)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionEntry>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) {
        if self.sessions.write().remove(id).is_some() {
            tracing::info!(session_id = %id, "Removed session");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<Uuid, Arc<SessionEntry>>) {
        let timeout = self.session_timeout;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, e)| e.is_expired(timeout))
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "Expired session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::Rubric;

    fn job() -> JobPosting {
        let rubric = Rubric {
            languages: vec!["Rust".to_string()],
            experience_level: "Senior".to_string(),
            core_skills: vec!["Ownership".to_string()],
            evaluation_focus: vec![],
        };
        JobPosting::new("Rust Engineer", vec!["Rust".to_string()], rubric)
    }

    #[test]
    fn test_session_creation_and_lookup() {
        let manager = SessionManager::new(10);
        let entry = manager.create(&job(), "Ada").unwrap();

        assert!(!entry.is_expired(Duration::from_secs(60)));
        assert!(manager.get(&entry.id).is_some());

        manager.remove(&entry.id);
        assert!(manager.get(&entry.id).is_none());
    }

    #[test]
    fn test_capacity_limit() {
        let manager = SessionManager::new(1);
        manager.create(&job(), "Ada").unwrap();
        assert!(manager.create(&job(), "Grace").is_err());
    }

    #[test]
    fn test_complete_sets_score_and_stage() {
        let manager = SessionManager::new(10);
        let entry = manager.create(&job(), "Ada").unwrap();
        entry.complete(75);

        let session = entry.session.read();
        assert!(session.is_completed);
        assert_eq!(session.overall_score, Some(75));
        assert_eq!(session.stage, InterviewStage::Completed);
    }
}
