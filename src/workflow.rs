use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, Language, PipelineConfig};
use crate::error::{Result, SubtransError};
use crate::events::{PipelineEvent, ProgressEvent};
use crate::pipeline::{Pipeline, TranslationOutcome};
use crate::subtitle::{read_srt, write_srt};
use crate::translate::{CompletionService, CompletionServiceFactory};

/// Counts from a directory run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySummary {
    pub translated: usize,
    pub failed: usize,
}

/// File-level driver around the translation pipeline
pub struct Workflow {
    config: Config,
    service: Arc<dyn CompletionService>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let service = CompletionServiceFactory::create_service(&config.translate)?;
        Ok(Self { config, service })
    }

    pub fn with_service(config: Config, service: Arc<dyn CompletionService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the configured provider serves the configured model
    pub async fn check_availability(&self) -> Result<()> {
        info!(
            "Checking {} availability for model '{}'",
            self.service.name(),
            self.config.translate.model
        );
        self.service
            .check_availability(&self.config.translate.model)
            .await
    }

    fn pipeline(&self, pipeline_config: PipelineConfig, cancel: CancellationToken) -> Pipeline {
        Pipeline::new(pipeline_config, self.service.clone()).with_cancellation(cancel)
    }

    /// Translate one SRT file and write the result
    pub async fn translate_file<F>(
        &self,
        input_path: &Path,
        output_path: Option<&Path>,
        pipeline_config: &PipelineConfig,
        cancel: CancellationToken,
        on_progress: F,
    ) -> Result<(PathBuf, TranslationOutcome)>
    where
        F: FnMut(ProgressEvent),
    {
        info!("Translating subtitle file: {}", input_path.display());

        let content = read_srt(input_path).await?;
        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input_path, None, pipeline_config.target_language())?,
        };

        let outcome = self
            .pipeline(pipeline_config.clone(), cancel)
            .translate(&content, on_progress)
            .await?;

        write_srt(&outcome.srt, &output_path).await?;

        info!(
            "Wrote {} ({} batches, {} skipped entries, {} fallback lines, {} mismatched batches)",
            output_path.display(),
            outcome.batches,
            outcome.skipped_entries,
            outcome.fallback_lines,
            outcome.mismatched_batches
        );

        Ok((output_path, outcome))
    }

    /// Translate one SRT file, handing every pipeline event to `on_event`.
    ///
    /// The translated file is written when the terminal `Done` event arrives.
    pub async fn stream_file<F>(
        &self,
        input_path: &Path,
        output_path: Option<&Path>,
        pipeline_config: &PipelineConfig,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(&PipelineEvent),
    {
        let content = read_srt(input_path).await?;
        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input_path, None, pipeline_config.target_language())?,
        };

        let mut events = self
            .pipeline(pipeline_config.clone(), cancel)
            .spawn_events(content);

        while let Some(event) = events.recv().await {
            on_event(&event);
            match event {
                PipelineEvent::Progress(_) => {}
                PipelineEvent::Done { srt } => {
                    write_srt(&srt, &output_path).await?;
                    return Ok(output_path);
                }
                PipelineEvent::Error { message, kind } => {
                    return Err(kind.into_error(message));
                }
            }
        }

        Err(SubtransError::Cancelled)
    }

    /// Translate every `.srt` file under `input_dir`.
    ///
    /// A file that fails is logged and skipped; the rest still run.
    pub async fn translate_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        pipeline_config: &PipelineConfig,
        cancel: CancellationToken,
    ) -> Result<DirectorySummary> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SubtransError::Config("Input path is not a directory".to_string()));
        }

        let language = pipeline_config.target_language();
        let suffix = output_suffix(language);
        let mut srt_files = Vec::new();

        for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_srt = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
            let is_own_output = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(&suffix));

            if !entry.file_type().is_file() || !is_srt {
                continue;
            }
            if is_own_output {
                debug!(
                    "Skipping {}: named like an existing {} translation",
                    path.display(),
                    language
                );
                continue;
            }
            srt_files.push(path.to_path_buf());
        }
        srt_files.sort();

        info!("Found {} subtitle files to translate", srt_files.len());

        let mut summary = DirectorySummary::default();
        for srt_path in srt_files {
            if cancel.is_cancelled() {
                return Err(SubtransError::Cancelled);
            }

            let output_path = default_output_path(&srt_path, output_dir, language)?;
            let result = self
                .translate_file(
                    &srt_path,
                    Some(output_path.as_path()),
                    pipeline_config,
                    cancel.clone(),
                    |_| {},
                )
                .await;
            match result {
                Ok(_) => {
                    info!("Successfully translated: {}", srt_path.display());
                    summary.translated += 1;
                }
                Err(SubtransError::Cancelled) => return Err(SubtransError::Cancelled),
                Err(e) => {
                    warn!("Failed to translate {}: {}", srt_path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn output_suffix(language: Language) -> String {
    format!("_{}.srt", language)
}

/// `<stem>_<Language>.srt`, next to the input unless `output_dir` is given
pub fn default_output_path(
    input_path: &Path,
    output_dir: Option<&Path>,
    language: Language,
) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .ok_or_else(|| SubtransError::Config("Invalid subtitle filename".to_string()))?
        .to_string_lossy();

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    Ok(dir.join(format!("{}{}", stem, output_suffix(language))))
}
