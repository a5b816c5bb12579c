use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{Completion, CompletionService};
use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

/// Completion service backed by a local Ollama server
pub struct OllamaService {
    client: Client,
    endpoint: String,
}

impl OllamaService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubtransError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TranslateConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl CompletionService for OllamaService {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion> {
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtransError::Provider(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtransError::Provider(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SubtransError::Provider(format!("Failed to parse response: {}", e)))?;

        let text = generated.response.trim().to_string();
        if text.is_empty() {
            return Err(SubtransError::Provider("Empty completion received".to_string()));
        }

        Ok(Completion { text })
    }

    async fn check_availability(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": model }))
            .send()
            .await
            .map_err(|e| SubtransError::Provider(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", model);
            Ok(())
        } else {
            Err(SubtransError::Provider(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                model, model
            )))
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_disables_streaming() {
        let request = GenerateRequest {
            model: "llama3.2:3b".to_string(),
            prompt: "Translate".to_string(),
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["model"], "llama3.2:3b");
    }

    #[test]
    fn test_endpoint_trailing_slash_is_removed() {
        let service =
            OllamaService::new("http://localhost:11434/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.endpoint, "http://localhost:11434");
        assert_eq!(service.name(), "ollama");
    }
}
