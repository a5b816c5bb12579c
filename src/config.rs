use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SubtransError};

/// Upper bound on units per completion call. A cost and latency guard, not a protocol limit.
pub const MAX_BATCH_COUNT: usize = 100;

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
}

/// Target languages accepted by the translation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    German,
    French,
    Persian,
    Chinese,
    Japanese,
    Indian,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::German,
        Language::French,
        Language::Persian,
        Language::Chinese,
        Language::Japanese,
        Language::Indian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::German => "German",
            Self::French => "French",
            Self::Persian => "Persian",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Indian => "Indian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = SubtransError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|l| l.name()).collect();
                SubtransError::Validation(format!(
                    "Invalid language '{}'. Valid languages: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent` REST API
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = SubtransError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err(SubtransError::Config(format!(
                "Invalid provider '{}'. Valid providers: gemini, ollama",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Completion service backend
    pub provider: ProviderKind,
    /// Base URL of the completion service
    pub endpoint: String,
    /// Environment variable holding the API key (Gemini only)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model used for completions
    pub model: String,
    /// Models a run may select
    pub allowed_models: Vec<String>,
    /// Default target language
    pub target_language: Language,
    /// Subtitle units sent per completion call (1..=100)
    pub batch_count: usize,
    /// Attempts per batch, including the first one
    pub max_retries: u32,
    /// Linear backoff step between attempts
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// HTTP timeout for a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                provider: ProviderKind::Gemini,
                endpoint: "https://generativelanguage.googleapis.com".to_string(),
                api_key_env: default_api_key_env(),
                model: "gemini-2.5-flash".to_string(),
                allowed_models: vec![
                    "gemini-2.5-flash".to_string(),
                    "gemini-1.5-flash".to_string(),
                ],
                target_language: Language::English,
                batch_count: MAX_BATCH_COUNT,
                max_retries: 3,
                retry_base_delay_ms: default_retry_base_delay_ms(),
                request_timeout_secs: default_request_timeout_secs(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtransError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubtransError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtransError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Build the per-run pipeline configuration, letting CLI values override the file.
    pub fn pipeline_config(
        &self,
        language: Option<&str>,
        batch_count: Option<usize>,
        model: Option<&str>,
    ) -> Result<PipelineConfig> {
        let translate = &self.translate;
        let target_language = match language {
            Some(name) => name.parse()?,
            None => translate.target_language,
        };
        let model = model.unwrap_or(&translate.model);

        if !translate.allowed_models.iter().any(|m| m == model) {
            return Err(SubtransError::Validation(format!(
                "Invalid model '{}'. Allowed models: {}",
                model,
                translate.allowed_models.join(", ")
            )));
        }

        PipelineConfig::new(
            target_language,
            batch_count.unwrap_or(translate.batch_count),
            model,
            translate.max_retries,
            Duration::from_millis(translate.retry_base_delay_ms),
        )
    }
}

/// Immutable settings for one translation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    target_language: Language,
    batch_count: usize,
    model: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl PipelineConfig {
    pub fn new(
        target_language: Language,
        batch_count: usize,
        model: impl Into<String>,
        max_retries: u32,
        retry_base_delay: Duration,
    ) -> Result<Self> {
        validate_batch_count(batch_count)?;
        if max_retries == 0 {
            return Err(SubtransError::Validation(
                "max_retries must be at least 1".to_string(),
            ));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(SubtransError::Validation("Missing model name".to_string()));
        }

        Ok(Self {
            target_language,
            batch_count,
            model,
            max_retries,
            retry_base_delay,
        })
    }

    pub fn target_language(&self) -> Language {
        self.target_language
    }

    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }
}

pub fn validate_batch_count(batch_count: usize) -> Result<()> {
    if batch_count == 0 || batch_count > MAX_BATCH_COUNT {
        return Err(SubtransError::Validation(format!(
            "Invalid batch count {}: must be between 1 and {}",
            batch_count, MAX_BATCH_COUNT
        )));
    }
    Ok(())
}
