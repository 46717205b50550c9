//! Per-answer metric records
//!
//! One record per graded turn. Records are append-only: nothing in the
//! orchestrator's path ever updates or deletes them, and the scorer reads
//! them back only at session end.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use interviewer_core::AnswerJudgment;

use crate::{PersistenceError, ScyllaClient};

/// Durable record of one graded turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerMetricRecord {
    pub record_id: Uuid,
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub understanding_score: u8,
    pub explainability_score: u8,
    pub evidence: String,
    pub critique: String,
    pub ideal_answer: String,
    pub missed_concepts: Vec<String>,
    pub is_cheating_suspected: bool,
    pub cheating_reason: Option<String>,
    pub is_off_topic: bool,
    pub bias_flag: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AnswerMetricRecord {
    /// Build a record from a graded exchange
    pub fn from_judgment(
        session_id: Uuid,
        question: &str,
        answer: &str,
        judgment: &AnswerJudgment,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            session_id,
            question: question.to_string(),
            answer: answer.to_string(),
            understanding_score: judgment.understanding_score,
            explainability_score: judgment.explainability_score,
            evidence: judgment.evidence.clone(),
            critique: judgment.critique.clone(),
            ideal_answer: judgment.ideal_answer.clone(),
            missed_concepts: judgment.missed_concepts.clone(),
            is_cheating_suspected: judgment.is_cheating_suspected,
            cheating_reason: judgment.cheating_reason.clone(),
            is_off_topic: judgment.is_off_topic,
            bias_flag: judgment.bias_flag,
            recorded_at: Utc::now(),
        }
    }
}

/// Metric store trait
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Append one record
    async fn record(&self, record: &AnswerMetricRecord) -> Result<(), PersistenceError>;

    /// All records for a session, oldest first
    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<AnswerMetricRecord>, PersistenceError>;
}

/// In-memory metric store (tests, persistence disabled)
#[derive(Default)]
pub struct InMemoryMetricStore {
    rows: RwLock<Vec<AnswerMetricRecord>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn record(&self, record: &AnswerMetricRecord) -> Result<(), PersistenceError> {
        self.rows.write().push(record.clone());
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<AnswerMetricRecord>, PersistenceError> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .iter()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.recorded_at);
        Ok(rows)
    }
}

/// ScyllaDB metric store
#[derive(Clone)]
pub struct ScyllaMetricStore {
    client: ScyllaClient,
}

impl ScyllaMetricStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricStore for ScyllaMetricStore {
    async fn record(&self, record: &AnswerMetricRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.answer_metrics (
                session_id, recorded_at_ms, record_id, question, answer,
                understanding_score, explainability_score, evidence, critique,
                ideal_answer, missed_concepts, is_cheating_suspected,
                cheating_reason, is_off_topic, bias_flag
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    record.session_id,
                    record.recorded_at.timestamp_millis(),
                    record.record_id,
                    record.question.as_str(),
                    record.answer.as_str(),
                    record.understanding_score as i32,
                    record.explainability_score as i32,
                    record.evidence.as_str(),
                    record.critique.as_str(),
                    record.ideal_answer.as_str(),
                    record.missed_concepts.clone(),
                    record.is_cheating_suspected,
                    record.cheating_reason.as_deref(),
                    record.is_off_topic,
                    record.bias_flag,
                ),
            )
            .await?;

        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<AnswerMetricRecord>, PersistenceError> {
        let query = format!(
            "SELECT session_id, recorded_at_ms, record_id, question, answer,
                    understanding_score, explainability_score, evidence, critique,
                    ideal_answer, missed_concepts, is_cheating_suspected,
                    cheating_reason, is_off_topic, bias_flag
             FROM {}.answer_metrics WHERE session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (*session_id,))
            .await?;

        let mut records = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (
                    session_id,
                    recorded_at_ms,
                    record_id,
                    question,
                    answer,
                    understanding_score,
                    explainability_score,
                    evidence,
                    critique,
                    ideal_answer,
                    missed_concepts,
                    is_cheating_suspected,
                    cheating_reason,
                    is_off_topic,
                    bias_flag,
                ): (
                    Uuid,
                    i64,
                    Uuid,
                    String,
                    String,
                    i32,
                    i32,
                    String,
                    String,
                    String,
                    Option<Vec<String>>,
                    bool,
                    Option<String>,
                    bool,
                    bool,
                ) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                records.push(AnswerMetricRecord {
                    record_id,
                    session_id,
                    question,
                    answer,
                    understanding_score: understanding_score.clamp(0, 10) as u8,
                    explainability_score: explainability_score.clamp(0, 10) as u8,
                    evidence,
                    critique,
                    ideal_answer,
                    missed_concepts: missed_concepts.unwrap_or_default(),
                    is_cheating_suspected,
                    cheating_reason,
                    is_off_topic,
                    bias_flag,
                    recorded_at: Utc
                        .timestamp_millis_opt(recorded_at_ms)
                        .single()
                        .unwrap_or_else(Utc::now),
                });
            }
        }

        Ok(records)
    }
}
