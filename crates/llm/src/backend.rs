//! Reasoning engine backend
//!
//! Wraps the hosted generateContent REST API. Two call shapes:
//! - `generate` for free-form text (response synthesis)
//! - `generate_json` for schema-constrained structured output (grading)
//!
//! Transient failures are retried with doubling backoff before the error is
//! handed back to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use interviewer_config::ReasoningConfig;

use crate::prompt::Message;
use crate::LlmError;

/// One request to the reasoning engine
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    /// System instructions (rubric context)
    pub system_instruction: String,
    /// Conversation contents, oldest first
    pub messages: Vec<Message>,
}

impl ReasoningRequest {
    pub fn new(system_instruction: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            messages,
        }
    }
}

/// Reasoning backend trait
///
/// The grader and synthesizer depend on this seam, not on the concrete HTTP
/// client, so tests can substitute canned responses.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Generate free-form text
    async fn generate(&self, request: &ReasoningRequest) -> Result<String, LlmError>;

    /// Generate JSON constrained by the given output schema
    async fn generate_json(
        &self,
        request: &ReasoningRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Hosted Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    config: ReasoningConfig,
}

impl GeminiBackend {
    pub fn new(config: ReasoningConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            tracing::warn!("reasoning api_key not set; requests will be rejected upstream");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    fn build_request(
        &self,
        request: &ReasoningRequest,
        schema: Option<&serde_json::Value>,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(ContentPart::text(&request.system_instruction)),
            contents: request
                .messages
                .iter()
                .map(|m| Content {
                    role: Some(m.role.wire_name().to_string()),
                    parts: vec![Part {
                        text: m.content.clone(),
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_tokens as u32),
                response_mime_type: schema.map(|_| "application/json".to_string()),
                response_schema: schema.cloned(),
            },
        }
    }

    /// Execute with retry; returns the first candidate's text
    async fn execute(&self, body: &GenerateContentRequest) -> Result<String, LlmError> {
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "reasoning request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.config.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_once(body).await {
                Ok(text) => return Ok(text),
                Err(e @ LlmError::Api(_)) => return Err(e),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Generation("retries exhausted".to_string())))
    }

    async fn execute_once(&self, body: &GenerateContentRequest) -> Result<String, LlmError> {
        let mut req = self.client.post(self.api_url()).json(body);
        if let Some(key) = &self.config.api_key {
            req = req.header("x-goog-api-key", key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            // 4xx is not transient; bail without retrying
            if status.is_client_error() {
                return Err(LlmError::Api(format!("{}: {}", status, detail)));
            }
            return Err(LlmError::Generation(format!("{}: {}", status, detail)));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::InvalidResponse("no candidates in response".to_string()))?;

        Ok(text)
    }
}

#[async_trait]
impl ReasoningBackend for GeminiBackend {
    async fn generate(&self, request: &ReasoningRequest) -> Result<String, LlmError> {
        let body = self.build_request(request, None);
        self.execute(&body).await
    }

    async fn generate_json(
        &self,
        request: &ReasoningRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        let body = self.build_request(request, Some(schema));
        let text = self.execute(&body).await?;
        serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("expected JSON: {} ({})", e, text)))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire format

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ContentPart>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ContentPart {
    parts: Vec<Part>,
}

impl ContentPart {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}
