use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{Result, SubtransError};
use crate::events::{PipelineEvent, ProgressEvent};
use crate::subtitle::{parse_srt, reassemble};
use crate::translate::{
    CompletionClient, CompletionService, TranslationRequest, batch_units, build_prompt,
    parse_response,
};

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Translated SRT text
    pub srt: String,
    pub batches: usize,
    /// Source entries dropped as malformed
    pub skipped_entries: usize,
    /// Response lines that needed a positional index
    pub fallback_lines: usize,
    /// Batches whose response line count differed from the units sent
    pub mismatched_batches: usize,
}

/// Drives parse, batch, translate and reassemble for one SRT document.
pub struct Pipeline {
    config: PipelineConfig,
    service: Arc<dyn CompletionService>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, service: Arc<dyn CompletionService>) -> Self {
        Self {
            config,
            service,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Translate `raw` batch by batch, calling `on_progress` after each batch.
    ///
    /// Batches run strictly in order. Any batch that exhausts its retries aborts
    /// the run and no partial output is returned.
    pub async fn translate<F>(&self, raw: &str, mut on_progress: F) -> Result<TranslationOutcome>
    where
        F: FnMut(ProgressEvent),
    {
        if raw.trim().is_empty() {
            return Err(SubtransError::Validation(
                "Missing or invalid SRT content".to_string(),
            ));
        }

        let parsed = parse_srt(raw);
        if parsed.units.is_empty() {
            return Err(SubtransError::Validation(format!(
                "No well-formed subtitle entries found ({} malformed)",
                parsed.skipped
            )));
        }

        let numbered: Vec<String> = parsed.units.iter().map(|u| u.numbered()).collect();
        let timestamps = parsed.timestamps();
        let batches = batch_units(&numbered, self.config.batch_count())?;
        let total_batches = batches.len();

        info!(
            "Translating {} subtitles ({} skipped) to {} in {} batches using {}",
            parsed.units.len(),
            parsed.skipped,
            self.config.target_language(),
            total_batches,
            self.config.model()
        );

        let client = CompletionClient::new(
            self.service.clone(),
            self.config.model(),
            self.config.max_retries(),
            self.config.retry_base_delay(),
            self.cancel.clone(),
        );

        let mut translated = Vec::with_capacity(total_batches);
        let mut fallback_lines = 0;
        let mut mismatched_batches = 0;

        for (i, batch) in batches.iter().enumerate() {
            info!("Translating batch {}/{} ({} subtitles)", i + 1, total_batches, batch.len);

            let prompt = build_prompt(&TranslationRequest {
                content: &batch.content,
                target_language: self.config.target_language(),
            });
            let completion = client.complete(&prompt).await?;

            let response = parse_response(&completion);
            fallback_lines += response.fallback_count;
            if response.lines.len() != batch.len {
                mismatched_batches += 1;
                warn!(
                    "Batch {} returned {} lines for {} subtitles",
                    i + 1,
                    response.lines.len(),
                    batch.len
                );
            }

            translated.push(reassemble(&response.lines, &timestamps[batch.range()]));

            let progress = ProgressEvent::new(i + 1, total_batches);
            info!(
                "Progress: {}% (batch {}/{})",
                progress.percent_complete, progress.batch_index, progress.total_batches
            );
            on_progress(progress);
        }

        Ok(TranslationOutcome {
            srt: format!("{}\n", translated.join("\n\n")),
            batches: total_batches,
            skipped_entries: parsed.skipped,
            fallback_lines,
            mismatched_batches,
        })
    }

    /// Run the pipeline on a background task and stream its events.
    ///
    /// Dropping the receiver cancels the run: no further completion calls are
    /// made and an in-flight call is abandoned.
    pub fn spawn_events(self, raw: String) -> mpsc::UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let cancel = self.cancel.clone();
            let progress_tx = tx.clone();

            let result = tokio::select! {
                result = self.translate(&raw, |progress| {
                    let _ = progress_tx.send(PipelineEvent::Progress(progress));
                }) => result,
                _ = tx.closed() => {
                    info!("Event consumer disconnected, cancelling translation");
                    cancel.cancel();
                    return;
                }
            };

            let terminal = match result {
                Ok(outcome) => PipelineEvent::Done { srt: outcome.srt },
                Err(e) => {
                    warn!("Translation failed: {}", e);
                    PipelineEvent::failed(&e)
                }
            };
            let _ = tx.send(terminal);
        });

        rx
    }
}
