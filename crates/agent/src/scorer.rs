//! End-of-session scoring
//!
//! Aggregates all persisted metric records into a final score and
//! recommendation. Pure over its input: scoring the same records twice
//! yields an identical report. The caller is responsible for draining the
//! background recorder before aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use interviewer_persistence::AnswerMetricRecord;

/// Score at or above which the candidate is recommended for hire
const HIRE_THRESHOLD: u32 = 70;
/// Score at or above which the candidate needs human review
const REVIEW_THRESHOLD: u32 = 50;
/// Ceiling applied when any turn was flagged for cheating
const CHEATING_CAP: u32 = 30;
/// Maximum weaknesses surfaced in the report
const MAX_WEAKNESSES: usize = 5;

/// Hiring recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Hire,
    NeedsReview,
    Reject,
    /// Rejected with at least one cheating-flagged turn
    RejectCheatingSuspected,
}

/// Report status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Completed,
    /// No graded turns were recorded
    Incomplete,
}

/// One row of the per-turn timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSummary {
    pub question: String,
    pub answer: String,
    pub understanding_score: u8,
    pub explainability_score: u8,
    pub critique: String,
    pub is_cheating_suspected: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Final interview report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub status: ReportStatus,
    pub overall_score: u32,
    /// `None` only for incomplete sessions
    pub recommendation: Option<Recommendation>,
    pub cheating_suspected: bool,
    pub timeline: Vec<TurnSummary>,
    /// Deduplicated missed concepts, insertion order, capped
    pub top_weaknesses: Vec<String>,
}

/// Aggregates persisted judgments into a final report
pub struct SessionScorer;

impl SessionScorer {
    /// Score a session from its metric records (oldest first)
    pub fn score(records: &[AnswerMetricRecord]) -> FinalReport {
        if records.is_empty() {
            return FinalReport {
                status: ReportStatus::Incomplete,
                overall_score: 0,
                recommendation: None,
                cheating_suspected: false,
                timeline: Vec::new(),
                top_weaknesses: Vec::new(),
            };
        }

        let sum: u32 = records.iter().map(|r| r.understanding_score as u32).sum();
        let average = sum as f64 / records.len() as f64;
        let mut overall_score = (average * 10.0).round() as u32;

        let cheating_suspected = records.iter().any(|r| r.is_cheating_suspected);
        if cheating_suspected {
            overall_score = overall_score.min(CHEATING_CAP);
        }

        let recommendation = if cheating_suspected {
            Recommendation::RejectCheatingSuspected
        } else if overall_score >= HIRE_THRESHOLD {
            Recommendation::Hire
        } else if overall_score >= REVIEW_THRESHOLD {
            Recommendation::NeedsReview
        } else {
            Recommendation::Reject
        };

        let timeline = records
            .iter()
            .map(|r| TurnSummary {
                question: r.question.clone(),
                answer: r.answer.clone(),
                understanding_score: r.understanding_score,
                explainability_score: r.explainability_score,
                critique: r.critique.clone(),
                is_cheating_suspected: r.is_cheating_suspected,
                recorded_at: r.recorded_at,
            })
            .collect();

        let mut top_weaknesses: Vec<String> = Vec::new();
        for record in records {
            for concept in &record.missed_concepts {
                let concept = concept.trim();
                if concept.is_empty() {
                    continue;
                }
                if top_weaknesses.iter().any(|w| w == concept) {
                    continue;
                }
                top_weaknesses.push(concept.to_string());
                if top_weaknesses.len() == MAX_WEAKNESSES {
                    break;
                }
            }
            if top_weaknesses.len() == MAX_WEAKNESSES {
                break;
            }
        }

        FinalReport {
            status: ReportStatus::Completed,
            overall_score,
            recommendation: Some(recommendation),
            cheating_suspected,
            timeline,
            top_weaknesses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::AnswerJudgment;
    use uuid::Uuid;

    fn record(score: u8, cheating: bool, missed: &[&str]) -> AnswerMetricRecord {
        let judgment = AnswerJudgment {
            understanding_score: score,
            is_cheating_suspected: cheating,
            missed_concepts: missed.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        AnswerMetricRecord::from_judgment(Uuid::new_v4(), "q", "a", &judgment)
    }

    #[test]
    fn test_zero_records_is_incomplete() {
        let report = SessionScorer::score(&[]);
        assert_eq!(report.status, ReportStatus::Incomplete);
        assert_eq!(report.overall_score, 0);
        assert!(report.recommendation.is_none());
    }

    #[test]
    fn test_average_of_7_5_is_hire() {
        // Six turns averaging 7.5 -> 75 -> HIRE
        let records: Vec<_> = [8, 7, 8, 7, 8, 7].iter().map(|&s| record(s, false, &[])).collect();
        let report = SessionScorer::score(&records);
        assert_eq!(report.overall_score, 75);
        assert_eq!(report.recommendation, Some(Recommendation::Hire));
        assert_eq!(report.timeline.len(), 6);
    }

    #[test]
    fn test_cheating_caps_score() {
        let records = vec![record(9, false, &[]), record(10, true, &[]), record(9, false, &[])];
        let report = SessionScorer::score(&records);
        assert!(report.overall_score <= 30);
        assert_eq!(
            report.recommendation,
            Some(Recommendation::RejectCheatingSuspected)
        );
        assert!(report.cheating_suspected);
    }

    #[test]
    fn test_needs_review_band() {
        let records = vec![record(5, false, &[]), record(6, false, &[])];
        let report = SessionScorer::score(&records);
        assert_eq!(report.overall_score, 55);
        assert_eq!(report.recommendation, Some(Recommendation::NeedsReview));
    }

    #[test]
    fn test_low_average_rejects() {
        let records = vec![record(3, false, &[]), record(4, false, &[])];
        let report = SessionScorer::score(&records);
        assert_eq!(report.recommendation, Some(Recommendation::Reject));
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let records = vec![record(8, false, &["indexes"]), record(4, true, &["caching"])];
        let first = SessionScorer::score(&records);
        let second = SessionScorer::score(&records);
        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.recommendation, second.recommendation);
        assert_eq!(first.top_weaknesses, second.top_weaknesses);
    }

    #[test]
    fn test_weaknesses_deduped_in_order_capped_at_five() {
        let records = vec![
            record(5, false, &["indexes", "caching"]),
            record(5, false, &["caching", "sharding"]),
            record(5, false, &["locks", "lifetimes", "pinning", "send-sync"]),
        ];
        let report = SessionScorer::score(&records);
        assert_eq!(
            report.top_weaknesses,
            vec!["indexes", "caching", "sharding", "locks", "lifetimes"]
        );
    }
}
