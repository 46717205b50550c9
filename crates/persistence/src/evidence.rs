//! Evidence snippets
//!
//! Created only when a judgment crosses the passing threshold: a quoted
//! proof-point tied to the rubric skill under discussion, kept as
//! supporting material for the final report.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PersistenceError, ScyllaClient};

/// A scored proof-point for one rubric skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    pub snippet_id: Uuid,
    pub session_id: Uuid,
    /// Rubric skill the quote supports
    pub skill: String,
    /// Verbatim candidate quote
    pub snippet: String,
    pub score: u8,
    pub recorded_at: DateTime<Utc>,
}

impl EvidenceSnippet {
    pub fn new(session_id: Uuid, skill: impl Into<String>, snippet: impl Into<String>, score: u8) -> Self {
        Self {
            snippet_id: Uuid::new_v4(),
            session_id,
            skill: skill.into(),
            snippet: snippet.into(),
            score,
            recorded_at: Utc::now(),
        }
    }
}

/// Evidence store trait
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Append one snippet
    async fn record(&self, snippet: &EvidenceSnippet) -> Result<(), PersistenceError>;

    /// All snippets for a session, oldest first
    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<EvidenceSnippet>, PersistenceError>;
}

/// In-memory evidence store (tests, persistence disabled)
#[derive(Default)]
pub struct InMemoryEvidenceStore {
    rows: RwLock<Vec<EvidenceSnippet>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn record(&self, snippet: &EvidenceSnippet) -> Result<(), PersistenceError> {
        self.rows.write().push(snippet.clone());
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<EvidenceSnippet>, PersistenceError> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .iter()
            .filter(|s| &s.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.recorded_at);
        Ok(rows)
    }
}

/// ScyllaDB evidence store
#[derive(Clone)]
pub struct ScyllaEvidenceStore {
    client: ScyllaClient,
}

impl ScyllaEvidenceStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceStore for ScyllaEvidenceStore {
    async fn record(&self, snippet: &EvidenceSnippet) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.evidence_snippets (
                session_id, recorded_at_ms, snippet_id, skill, snippet, score
             ) VALUES (?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    snippet.session_id,
                    snippet.recorded_at.timestamp_millis(),
                    snippet.snippet_id,
                    snippet.skill.as_str(),
                    snippet.snippet.as_str(),
                    snippet.score as i32,
                ),
            )
            .await?;

        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<EvidenceSnippet>, PersistenceError> {
        let query = format!(
            "SELECT session_id, recorded_at_ms, snippet_id, skill, snippet, score
             FROM {}.evidence_snippets WHERE session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (*session_id,))
            .await?;

        let mut snippets = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (session_id, recorded_at_ms, snippet_id, skill, snippet, score): (
                    Uuid,
                    i64,
                    Uuid,
                    String,
                    String,
                    i32,
                ) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                snippets.push(EvidenceSnippet {
                    snippet_id,
                    session_id,
                    skill,
                    snippet,
                    score: score.clamp(0, 10) as u8,
                    recorded_at: Utc
                        .timestamp_millis_opt(recorded_at_ms)
                        .single()
                        .unwrap_or_else(Utc::now),
                });
            }
        }

        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_roundtrip() {
        let store = InMemoryEvidenceStore::new();
        let session = Uuid::new_v4();

        store
            .record(&EvidenceSnippet::new(session, "Ownership", "moves vs borrows", 9))
            .await
            .unwrap();
        store
            .record(&EvidenceSnippet::new(Uuid::new_v4(), "Other", "other", 8))
            .await
            .unwrap();

        let rows = store.list_for_session(&session).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].skill, "Ownership");
        assert_eq!(rows[0].score, 9);
    }
}
