//! Persistence layer for the voice interviewer
//!
//! Provides durable storage for:
//! - Per-answer metric records (append-only, one per graded turn)
//! - Evidence snippets (only for answers crossing the passing threshold)
//!
//! Every store has a ScyllaDB implementation and an in-memory one; the
//! latter backs tests and deployments with persistence disabled.

pub mod client;
pub mod evidence;
pub mod metrics;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use evidence::{EvidenceSnippet, EvidenceStore, InMemoryEvidenceStore, ScyllaEvidenceStore};
pub use metrics::{AnswerMetricRecord, InMemoryMetricStore, MetricStore, ScyllaMetricStore};

use std::sync::Arc;

use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<scylla::transport::errors::QueryError> for PersistenceError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<scylla::transport::errors::NewSessionError> for PersistenceError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        PersistenceError::Connection(err.to_string())
    }
}

impl From<PersistenceError> for interviewer_core::Error {
    fn from(err: PersistenceError) -> Self {
        interviewer_core::Error::Persistence(err.to_string())
    }
}

/// Combined persistence layer with all stores
pub struct PersistenceLayer {
    pub metrics: Arc<dyn MetricStore>,
    pub evidence: Arc<dyn EvidenceStore>,
}

/// Initialize the persistence layer against ScyllaDB
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        metrics: Arc::new(ScyllaMetricStore::new(client.clone())),
        evidence: Arc::new(ScyllaEvidenceStore::new(client)),
    })
}

impl PersistenceLayer {
    /// In-memory layer for tests and persistence-disabled deployments
    pub fn in_memory() -> Self {
        Self {
            metrics: Arc::new(InMemoryMetricStore::new()),
            evidence: Arc::new(InMemoryEvidenceStore::new()),
        }
    }
}
