//! ScyllaDB schema creation
//!
//! Timestamps are stored as epoch milliseconds in BIGINT columns so reads
//! and writes bind plain i64 values.

use scylla::Session;

use crate::PersistenceError;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    // Per-answer metric records, append-only, clustered by recording time
    let metrics_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.answer_metrics (
            session_id UUID,
            recorded_at_ms BIGINT,
            record_id UUID,
            question TEXT,
            answer TEXT,
            understanding_score INT,
            explainability_score INT,
            evidence TEXT,
            critique TEXT,
            ideal_answer TEXT,
            missed_concepts LIST<TEXT>,
            is_cheating_suspected BOOLEAN,
            cheating_reason TEXT,
            is_off_topic BOOLEAN,
            bias_flag BOOLEAN,
            PRIMARY KEY ((session_id), recorded_at_ms, record_id)
        ) WITH CLUSTERING ORDER BY (recorded_at_ms ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(metrics_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create answer_metrics table: {}", e))
        })?;

    // Evidence snippets for answers that crossed the passing threshold
    let evidence_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.evidence_snippets (
            session_id UUID,
            recorded_at_ms BIGINT,
            snippet_id UUID,
            skill TEXT,
            snippet TEXT,
            score INT,
            PRIMARY KEY ((session_id), recorded_at_ms, snippet_id)
        ) WITH CLUSTERING ORDER BY (recorded_at_ms ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(evidence_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create evidence_snippets table: {}", e))
        })?;

    Ok(())
}
