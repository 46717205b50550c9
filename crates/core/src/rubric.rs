//! Rubric and job posting types
//!
//! A rubric is immutable once an interview session starts: the orchestrator
//! loads it once into session-scoped state and never writes it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Evaluation rubric for a job posting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    /// Technologies/languages the candidate is evaluated on
    #[serde(default)]
    pub languages: Vec<String>,
    /// Target experience level (e.g. "Mid-Level", "Senior")
    #[serde(default)]
    pub experience_level: String,
    /// Ordered list of core skills to probe
    pub core_skills: Vec<String>,
    /// Evaluation focus dimensions (e.g. "System Design", "Code Quality")
    #[serde(default)]
    pub evaluation_focus: Vec<String>,
}

impl Rubric {
    /// Validate that the rubric is usable for an interview
    pub fn validate(&self) -> Result<(), Error> {
        if self.core_skills.is_empty() {
            return Err(Error::InvalidInput(
                "rubric must define at least one core skill".to_string(),
            ));
        }
        if self.core_skills.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "rubric core skills must be non-empty strings".to_string(),
            ));
        }
        Ok(())
    }

    /// Skill at the given rotation index, wrapping around the ordered list
    pub fn skill_at(&self, index: usize) -> &str {
        &self.core_skills[index % self.core_skills.len()]
    }

    /// Comma-joined summary used in prompts and logs
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) — skills: {}",
            self.languages.join(", "),
            self.experience_level,
            self.core_skills.join(", ")
        )
    }
}

/// A job posting a candidate interviews for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    /// Tech stack advertised for the role
    #[serde(default)]
    pub stack: Vec<String>,
    pub rubric: Rubric,
    pub created_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn new(title: impl Into<String>, stack: Vec<String>, rubric: Rubric) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            stack,
            rubric,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> Rubric {
        Rubric {
            languages: vec!["Rust".to_string()],
            experience_level: "Senior".to_string(),
            core_skills: vec!["Async Runtimes".to_string(), "Ownership".to_string()],
            evaluation_focus: vec!["Technical Depth".to_string()],
        }
    }

    #[test]
    fn test_rubric_validation() {
        assert!(rubric().validate().is_ok());

        let empty = Rubric {
            core_skills: vec![],
            ..rubric()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_skill_rotation_wraps() {
        let r = rubric();
        assert_eq!(r.skill_at(0), "Async Runtimes");
        assert_eq!(r.skill_at(1), "Ownership");
        assert_eq!(r.skill_at(2), "Async Runtimes");
    }
}
