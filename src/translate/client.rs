use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::CompletionService;
use crate::error::{Result, SubtransError};

/// Runs prompts against a completion service with linear backoff between attempts.
pub struct CompletionClient {
    service: Arc<dyn CompletionService>,
    model: String,
    max_retries: u32,
    base_delay: Duration,
    cancel: CancellationToken,
}

impl CompletionClient {
    pub fn new(
        service: Arc<dyn CompletionService>,
        model: impl Into<String>,
        max_retries: u32,
        base_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            model: model.into(),
            max_retries: max_retries.max(1),
            base_delay,
            cancel,
        }
    }

    /// Complete `prompt`, retrying up to `max_retries` attempts in total.
    ///
    /// Attempt `n` failing waits `n * base_delay` before the next one. Only the
    /// last failure is returned.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        for attempt in 1..=self.max_retries {
            if self.cancel.is_cancelled() {
                return Err(SubtransError::Cancelled);
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return Err(SubtransError::Cancelled),
                result = self.service.generate(&self.model, prompt) => result,
            };

            match result {
                Ok(completion) => {
                    debug!("Raw {} response: {}", self.service.name(), completion.text);
                    return Ok(completion.text);
                }
                Err(e) if attempt == self.max_retries => {
                    return Err(SubtransError::Completion {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    let delay = self.base_delay * attempt;
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(SubtransError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        Err(SubtransError::Completion {
            attempts: self.max_retries,
            message: "no attempts were made".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{Completion, MockCompletionService};
    use mockall::Sequence;

    fn client(mock: MockCompletionService, max_retries: u32) -> CompletionClient {
        CompletionClient::new(
            Arc::new(mock),
            "test-model",
            max_retries,
            Duration::from_millis(1),
            CancellationToken::new(),
        )
    }

    fn service_with_name() -> MockCompletionService {
        let mut mock = MockCompletionService::new();
        mock.expect_name().return_const("mock");
        mock
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut mock = service_with_name();
        mock.expect_generate()
            .withf(|model, prompt| model == "test-model" && prompt == "hello")
            .times(1)
            .returning(|_, _| Ok(Completion { text: "1. hola".to_string() }));

        let text = client(mock, 3).complete("hello").await.unwrap();
        assert_eq!(text, "1. hola");
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let mut mock = service_with_name();
        let mut seq = Sequence::new();
        mock.expect_generate()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SubtransError::Provider("503 unavailable".to_string())));
        mock.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Completion { text: "ok".to_string() }));

        let text = client(mock, 3).complete("prompt").await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let mut mock = service_with_name();
        let mut calls = 0;
        mock.expect_generate().times(3).returning(move |_, _| {
            calls += 1;
            Err(SubtransError::Provider(format!("failure {}", calls)))
        });

        let err = client(mock, 3).complete("prompt").await.unwrap_err();
        match err {
            SubtransError::Completion { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("failure 3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly_and_skips_final_wait() {
        let mut mock = service_with_name();
        mock.expect_generate()
            .times(3)
            .returning(|_, _| Err(SubtransError::Provider("down".to_string())));

        let client = CompletionClient::new(
            Arc::new(mock),
            "test-model",
            3,
            Duration::from_secs(1),
            CancellationToken::new(),
        );

        let start = tokio::time::Instant::now();
        let result = client.complete("prompt").await;

        // 1s after the first failure, 2s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(matches!(result, Err(SubtransError::Completion { attempts: 3, .. })));
    }

    #[tokio::test]
    async fn test_cancelled_client_makes_no_calls() {
        let mut mock = service_with_name();
        mock.expect_generate().times(0);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = CompletionClient::new(
            Arc::new(mock),
            "test-model",
            3,
            Duration::from_millis(1),
            cancel,
        );

        assert!(matches!(client.complete("prompt").await, Err(SubtransError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_stops_retrying() {
        let mut mock = service_with_name();
        mock.expect_generate()
            .times(1)
            .returning(|_, _| Err(SubtransError::Provider("down".to_string())));

        let cancel = CancellationToken::new();
        let client = CompletionClient::new(
            Arc::new(mock),
            "test-model",
            3,
            Duration::from_secs(60),
            cancel.clone(),
        );

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        assert!(matches!(client.complete("prompt").await, Err(SubtransError::Cancelled)));
        canceller.await.unwrap();
    }
}
