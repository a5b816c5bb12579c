//! subtrans - translate SRT subtitles with LLM completion services
//!
//! Entry point for the command-line tool: loads configuration, sets up
//! logging and dispatches to the translation workflow.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrans::cli::{Args, Commands};
use subtrans::config::{Config, Language};
use subtrans::events::{ProgressEvent, SseWriter};
use subtrans::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "subtrans.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling translation");
                cancel.cancel();
            }
        });
    }

    match args.command {
        Commands::Translate { input, output, language, batch_count, model, sse } => {
            let pipeline_config =
                config.pipeline_config(language.as_deref(), batch_count, model.as_deref())?;
            let workflow = Workflow::new(config)?;

            if sse {
                let mut stdout = SseWriter::new(std::io::stdout(), cancel.clone());
                let written = workflow
                    .stream_file(&input, output.as_deref(), &pipeline_config, cancel, |event| {
                        stdout.send(event)
                    })
                    .await?;
                info!("Translated subtitles written to {}", written.display());
            } else {
                let progress_bar = ProgressBar::new(0);
                progress_bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%)",
                    )?
                    .progress_chars("#>-"),
                );

                let on_progress = |progress: ProgressEvent| {
                    progress_bar.set_length(progress.total_batches as u64);
                    progress_bar.set_position(progress.batch_index as u64);
                };
                let result = workflow
                    .translate_file(
                        &input,
                        output.as_deref(),
                        &pipeline_config,
                        cancel,
                        on_progress,
                    )
                    .await;

                match result {
                    Ok((written, outcome)) => {
                        progress_bar.finish_with_message("done");
                        println!("Translated subtitles written to {}", written.display());
                        if outcome.skipped_entries > 0 || outcome.fallback_lines > 0 {
                            println!(
                                "Skipped {} malformed entries, {} response lines without numbering",
                                outcome.skipped_entries, outcome.fallback_lines
                            );
                        }
                        if outcome.mismatched_batches > 0 {
                            println!(
                                "Warning: {} batches returned a different number of lines; check timing",
                                outcome.mismatched_batches
                            );
                        }
                    }
                    Err(e) => {
                        progress_bar.abandon();
                        return Err(e.into());
                    }
                }
            }
        }
        Commands::Batch { input_dir, output_dir, language, batch_count, model } => {
            let pipeline_config =
                config.pipeline_config(language.as_deref(), batch_count, model.as_deref())?;
            let workflow = Workflow::new(config)?;

            let summary = workflow
                .translate_directory(&input_dir, output_dir.as_deref(), &pipeline_config, cancel)
                .await?;
            println!(
                "Translated {} files, {} failed",
                summary.translated, summary.failed
            );
        }
        Commands::Check => {
            let workflow = Workflow::new(config)?;
            workflow.check_availability().await?;
            println!(
                "Model '{}' is available",
                workflow.config().translate.model
            );
        }
        Commands::Languages => {
            println!("\nTarget languages:");
            for language in Language::ALL {
                println!("  {}", language);
            }
            println!("\nAllowed models:");
            for model in &config.translate.allowed_models {
                let marker = if *model == config.translate.model { " (default)" } else { "" };
                println!("  {}{}", model, marker);
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so `--sse` keeps stdout clean
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subtrans.log").display()
    );

    Ok(())
}
