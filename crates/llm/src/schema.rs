//! Output schema for structured judgments
//!
//! The reasoning engine is asked for schema-constrained JSON; the schema
//! below mirrors `AnswerJudgment` field for field. Types use the uppercase
//! names the generateContent API expects.

use serde_json::{json, Map, Value};

/// Builder for generateContent response schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn property(mut self, name: &str, spec: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), spec);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn integer(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({"type": "INTEGER", "description": description}),
            true,
        )
    }

    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({"type": "STRING", "description": description}),
            required,
        )
    }

    pub fn boolean(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({"type": "BOOLEAN", "description": description}),
            true,
        )
    }

    pub fn string_array(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": description,
            }),
            false,
        )
    }

    pub fn build(self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": self.properties,
            "required": self.required,
        })
    }
}

/// Schema for one answer judgment
pub fn judgment_schema() -> Value {
    SchemaBuilder::new()
        .integer("understanding_score", "Topic understanding, 1-10")
        .integer("explainability_score", "Clarity of explanation, 1-10")
        .string("evidence", "Verbatim quote from the answer supporting the score", true)
        .string("critique", "Short critique of the answer", true)
        .string("ideal_answer", "What a strong answer would have covered", true)
        .string_array("missed_concepts", "Technical concepts the candidate missed")
        .boolean("is_cheating_suspected", "Answer looks read or externally assisted")
        .string("cheating_reason", "Why cheating is suspected, if it is", false)
        .boolean("is_off_topic", "Nonsensical or entirely unrelated content")
        .boolean("needs_clarification", "Candidate asked for the question to be repeated or explained")
        .boolean("bias_flag", "Grading may be influenced by non-technical attributes")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgment_schema_shape() {
        let schema = judgment_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["understanding_score"]["type"], "INTEGER");
        assert_eq!(schema["properties"]["missed_concepts"]["type"], "ARRAY");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(required.contains(&"understanding_score"));
        assert!(required.contains(&"is_cheating_suspected"));
        // Optional fields are left out of required so null/missing is legal
        assert!(!required.contains(&"cheating_reason"));
        assert!(!required.contains(&"missed_concepts"));
    }
}
