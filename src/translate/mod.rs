// Translation building blocks
//
// The pipeline talks to text-generation providers only through `CompletionService`:
// - gemini: Google Gemini generateContent API
// - ollama: local Ollama server
//
// Around that boundary sit the batcher, the prompt builder, the retrying client
// and the parser that turns free-text model output back into numbered lines.

pub mod batch;
pub mod client;
pub mod gemini;
pub mod ollama;
pub mod prompt;
pub mod response;

use async_trait::async_trait;
use std::sync::Arc;

pub use batch::{Batch, batch_units};
pub use client::CompletionClient;
pub use prompt::{TranslationRequest, build_prompt};
pub use response::{ParsedResponse, parse_response};

use crate::config::{ProviderKind, TranslateConfig};
use crate::error::Result;

/// Text returned by one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

/// A provider that turns one prompt into free text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run a single completion. Failures are not retried here.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Completion>;

    /// Check that the service is reachable and serves `model`
    async fn check_availability(&self, model: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Factory for creating completion services
pub struct CompletionServiceFactory;

impl CompletionServiceFactory {
    pub fn create_service(config: &TranslateConfig) -> Result<Arc<dyn CompletionService>> {
        match config.provider {
            ProviderKind::Gemini => Ok(Arc::new(gemini::GeminiService::from_config(config)?)),
            ProviderKind::Ollama => Ok(Arc::new(ollama::OllamaService::from_config(config)?)),
        }
    }
}
