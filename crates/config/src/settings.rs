//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP/WebSocket server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Reasoning engine (grading + synthesis) configuration
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Speech-to-text and text-to-speech configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Pub/sub channel configuration
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Interview policy: turn budget, drill depth, grading thresholds
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Persistence configuration (ScyllaDB)
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Settings {
    /// Validate settings for the configured environment
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interview.validate()?;

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }

        if self.environment.is_strict() {
            if self.reasoning.api_key.is_none() {
                return Err(ConfigError::Invalid(
                    "reasoning.api_key required outside development".into(),
                ));
            }
            if self.speech.stt.api_key.is_none() {
                return Err(ConfigError::Invalid(
                    "speech.stt.api_key required outside development".into(),
                ));
            }
            if self.channel.token_secret == default_token_secret() {
                return Err(ConfigError::Invalid(
                    "channel.token_secret must be overridden outside development".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Reasoning engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// API base endpoint
    #[serde(default = "default_reasoning_endpoint")]
    pub endpoint: String,
    /// Model ID
    #[serde(default = "default_reasoning_model")]
    pub model: String,
    /// API key; falls back to GEMINI_API_KEY env var
    #[serde(default = "default_reasoning_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial backoff in milliseconds (doubles each retry)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_reasoning_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_reasoning_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_reasoning_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> usize {
    1024
}

fn default_reasoning_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            endpoint: default_reasoning_endpoint(),
            model: default_reasoning_model(),
            api_key: default_reasoning_api_key(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_reasoning_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Combined speech configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    #[serde(default)]
    pub stt: SttSettings,
    #[serde(default)]
    pub tts: TtsSettings,
}

/// Speech-to-text streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    /// WebSocket endpoint for the streaming recognizer
    #[serde(default = "default_stt_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_stt_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// PCM sample rate of candidate audio
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Keepalive cadence while the turn loop is thinking
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// API key; falls back to DEEPGRAM_API_KEY env var
    #[serde(default = "default_stt_api_key")]
    pub api_key: Option<String>,
}

fn default_stt_endpoint() -> String {
    "wss://api.deepgram.com/v1/listen".to_string()
}

fn default_stt_model() -> String {
    "nova-3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_keepalive_secs() -> u64 {
    3
}

fn default_stt_api_key() -> Option<String> {
    std::env::var("DEEPGRAM_API_KEY").ok()
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            endpoint: default_stt_endpoint(),
            model: default_stt_model(),
            language: default_language(),
            sample_rate: default_sample_rate(),
            keepalive_secs: default_keepalive_secs(),
            api_key: default_stt_api_key(),
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,
    /// Voice model ID
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Bytes per streamed audio chunk (PCM16: 2 bytes per sample)
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,
    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,
    /// API key; falls back to DEEPGRAM_API_KEY env var
    #[serde(default = "default_stt_api_key")]
    pub api_key: Option<String>,
}

fn default_tts_endpoint() -> String {
    "https://api.deepgram.com/v1/speak".to_string()
}

fn default_voice() -> String {
    "aura-asteria-en".to_string()
}

fn default_encoding() -> String {
    "linear16".to_string()
}

fn default_chunk_bytes() -> usize {
    // ~256ms at 16kHz PCM16
    8192
}

fn default_tts_timeout_secs() -> u64 {
    20
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            voice: default_voice(),
            encoding: default_encoding(),
            sample_rate: default_sample_rate(),
            chunk_bytes: default_chunk_bytes(),
            timeout_secs: default_tts_timeout_secs(),
            api_key: default_stt_api_key(),
        }
    }
}

/// Pub/sub channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Publish API endpoint of the channel server
    #[serde(default = "default_channel_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// HS256 secret for connection tokens
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// Connection token lifetime
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Channel namespace prefix
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// WebSocket URL handed to connecting clients
    #[serde(default = "default_channel_ws_url")]
    pub ws_url: String,
}

fn default_channel_api_url() -> String {
    "http://127.0.0.1:8001/api".to_string()
}

fn default_token_secret() -> String {
    "dev-only-secret".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_namespace() -> String {
    "interviews".to_string()
}

fn default_channel_ws_url() -> String {
    "ws://127.0.0.1:8001/connection/websocket".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            api_url: default_channel_api_url(),
            api_key: String::new(),
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            namespace: default_namespace(),
            ws_url: default_channel_ws_url(),
        }
    }
}

/// Interview policy configuration
///
/// Thresholds are configurable on purpose; the defaults below are the
/// representative values, not the only valid ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Maximum graded turns before the interview wraps up
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Consecutive deepening follow-ups allowed on one topic
    #[serde(default = "default_max_drill_depth")]
    pub max_drill_depth: u32,
    /// Understanding score at or above which evidence snippets are recorded
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
    /// Understanding score at or above which the topic is drilled deeper
    #[serde(default = "default_excellent_threshold")]
    pub excellent_threshold: u8,
    /// Understanding score below which the candidate is reassured and pivoted
    #[serde(default = "default_low_threshold")]
    pub low_threshold: u8,
    /// Response gap beyond which a polished answer looks read
    #[serde(default = "default_cheating_gap_secs")]
    pub cheating_gap_secs: f32,
    /// Prior turns shown to the grader for drift detection
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_max_turns() -> u32 {
    6
}

fn default_max_drill_depth() -> u32 {
    2
}

fn default_pass_threshold() -> u8 {
    7
}

fn default_excellent_threshold() -> u8 {
    8
}

fn default_low_threshold() -> u8 {
    4
}

fn default_cheating_gap_secs() -> f32 {
    8.0
}

fn default_history_window() -> usize {
    3
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_drill_depth: default_max_drill_depth(),
            pass_threshold: default_pass_threshold(),
            excellent_threshold: default_excellent_threshold(),
            low_threshold: default_low_threshold(),
            cheating_gap_secs: default_cheating_gap_secs(),
            history_window: default_history_window(),
        }
    }
}

impl InterviewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("interview.max_turns must be >= 1".into()));
        }
        if self.history_window == 0 {
            return Err(ConfigError::Invalid(
                "interview.history_window must be >= 1".into(),
            ));
        }
        if self.low_threshold >= self.pass_threshold
            || self.pass_threshold > self.excellent_threshold
            || self.excellent_threshold > 10
        {
            return Err(ConfigError::Invalid(format!(
                "interview thresholds must satisfy low < pass <= excellent <= 10 (got {} / {} / {})",
                self.low_threshold, self.pass_threshold, self.excellent_threshold
            )));
        }
        Ok(())
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "voice_interviewer".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.toml > config/default.toml > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("INTERVIEWER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.interview.max_turns, 6);
        assert_eq!(settings.interview.pass_threshold, 7);
        assert_eq!(settings.interview.excellent_threshold, 8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        let mut settings = Settings::default();
        settings.interview.pass_threshold = 9;
        settings.interview.excellent_threshold = 8;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_strict_env_requires_secrets() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.reasoning.api_key = Some("key".to_string());
        settings.speech.stt.api_key = Some("key".to_string());
        // Default token secret is rejected in production
        assert!(settings.validate().is_err());
        settings.channel.token_secret = "real-secret".to_string();
        assert!(settings.validate().is_ok());
    }
}
