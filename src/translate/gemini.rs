use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{Completion, CompletionService};
use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        Some(text)
    }
}

/// Completion service backed by the Gemini `generateContent` REST API
pub struct GeminiService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiService {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SubtransError::Config("Missing Google API key".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubtransError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Read the API key from the environment variable named in the config
    pub fn from_config(config: &TranslateConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SubtransError::Config(format!(
                "Missing Google API key: set the {} environment variable",
                config.api_key_env
            ))
        })?;

        Self::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}", self.endpoint, model)
    }
}

#[async_trait]
impl CompletionService for GeminiService {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!("{}:generateContent", self.model_url(model));
        debug!("Sending completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtransError::Provider(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtransError::Provider(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SubtransError::Provider(format!("Failed to parse response: {}", e)))?;

        match generated.text() {
            Some(text) if !text.trim().is_empty() => Ok(Completion { text }),
            _ => Err(SubtransError::Provider("Empty completion received".to_string())),
        }
    }

    async fn check_availability(&self, model: &str) -> Result<()> {
        let response = self
            .client
            .get(self.model_url(model))
            .header("x-goog-api-key", self.api_key.as_str())
            .send()
            .await
            .map_err(|e| SubtransError::Provider(format!("Failed to connect to Gemini: {}", e)))?;

        if response.status().is_success() {
            info!("Gemini model '{}' is available", model);
            Ok(())
        } else {
            Err(SubtransError::Provider(format!(
                "Gemini model '{}' is not available ({})",
                model,
                response.status()
            )))
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
