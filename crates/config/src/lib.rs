//! Configuration management for the voice interviewer
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{env}.toml)
//! - Environment variables (INTERVIEWER__ prefix, `__` separator)
//! - Runtime overrides
//!
//! Grading thresholds are deliberately configuration rather than constants:
//! the pass and excellence cut-offs vary per deployment.

pub mod settings;

pub use settings::{
    load_settings, ChannelConfig, InterviewConfig, PersistenceConfig, ReasoningConfig,
    RuntimeEnvironment, ServerConfig, Settings, SpeechConfig, SttSettings, TtsSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),
}
