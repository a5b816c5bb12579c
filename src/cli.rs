use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single SRT file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file (default: <stem>_<language>.srt next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target language (default from config)
        #[arg(short, long)]
        language: Option<String>,

        /// Subtitles per completion call, 1-100 (default from config)
        #[arg(short, long)]
        batch_count: Option<usize>,

        /// Model to use (default from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Write progress as server-sent events to stdout instead of a progress bar
        #[arg(long)]
        sse: bool,
    },

    /// Translate every SRT file in a directory
    Batch {
        /// Input directory containing subtitle files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for translated files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Target language (default from config)
        #[arg(short, long)]
        language: Option<String>,

        /// Subtitles per completion call, 1-100 (default from config)
        #[arg(short, long)]
        batch_count: Option<usize>,

        /// Model to use (default from config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check that the completion service and model are available
    Check,

    /// List supported target languages and allowed models
    Languages,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "subtrans.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_arguments() {
        let args = Args::parse_from([
            "subtrans", "-v", "translate", "-i", "movie.srt", "-l", "German", "-b", "25", "--sse",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Translate { input, output, language, batch_count, model, sse } => {
                assert_eq!(input, PathBuf::from("movie.srt"));
                assert!(output.is_none());
                assert_eq!(language.as_deref(), Some("German"));
                assert_eq!(batch_count, Some(25));
                assert!(model.is_none());
                assert!(sse);
            }
            _ => panic!("expected translate command"),
        }
    }

    #[test]
    fn test_init_config_default_path() {
        let args = Args::parse_from(["subtrans", "init-config"]);
        match args.command {
            Commands::InitConfig { output } => assert_eq!(output, PathBuf::from("subtrans.toml")),
            _ => panic!("expected init-config command"),
        }
    }
}
