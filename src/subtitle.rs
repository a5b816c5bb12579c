use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Result, SubtransError};

/// One SRT entry with its caption collapsed to a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleUnit {
    /// Label as written in the source file, never renumbered
    pub index: String,
    /// Raw `start --> end` line, passed through untouched
    pub timestamp_line: String,
    pub text: String,
}

impl SubtitleUnit {
    /// `"<index>.<text>"`, the shape sent to the completion service
    pub fn numbered(&self) -> String {
        format!("{}.{}", self.index, self.text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSubtitles {
    pub units: Vec<SubtitleUnit>,
    /// Entries dropped for having fewer than three lines
    pub skipped: usize,
}

impl ParsedSubtitles {
    pub fn timestamps(&self) -> Vec<String> {
        self.units.iter().map(|u| u.timestamp_line.clone()).collect()
    }
}

/// A translated caption paired with the index it was returned under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedLine {
    pub index: String,
    pub text: String,
    /// True when the index was synthesised from the line position
    pub fallback: bool,
}

impl fmt::Display for TranslatedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.index, self.text)
    }
}

/// Replace `\r\n` and lone `\r` with `\n`
pub fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split raw SRT text into units, skipping entries that lack an index,
/// a timestamp and at least one line of text.
pub fn parse_srt(content: &str) -> ParsedSubtitles {
    let content = normalize_newlines(content);
    let mut parsed = ParsedSubtitles::default();

    for (position, entry) in content.split("\n\n").enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let lines: Vec<&str> = entry.split('\n').collect();
        if lines.len() < 3 {
            warn!("Skipping malformed SRT entry at position {}: {:?}", position, entry);
            parsed.skipped += 1;
            continue;
        }

        parsed.units.push(SubtitleUnit {
            index: lines[0].to_string(),
            timestamp_line: lines[1].to_string(),
            text: lines[2..].join(" "),
        });
    }

    parsed
}

/// Pair translated lines with timestamps by position and render SRT entries.
///
/// Line `i` always receives `timestamps[i]`; a response that merged or split
/// captions therefore shifts every later timestamp in the batch. Lines past the
/// end of `timestamps` have no timing and are dropped.
pub fn reassemble(lines: &[TranslatedLine], timestamps: &[String]) -> String {
    if lines.len() != timestamps.len() {
        warn!(
            "Translated line count {} does not match subtitle count {}; timing may be misaligned",
            lines.len(),
            timestamps.len()
        );
    }

    lines
        .iter()
        .zip(timestamps)
        .map(|(line, timestamp)| format!("{}\n{}\n{}", line.index, timestamp, line.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SubtransError::FileNotFound(path.display().to_string()));
    }
    Ok(fs::read_to_string(path).await?)
}

pub async fn write_srt<P: AsRef<Path>>(content: &str, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing SRT file: {}", output_path.display());

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(output_path, content).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n";

    fn line(index: &str, text: &str) -> TranslatedLine {
        TranslatedLine {
            index: index.to_string(),
            text: text.to_string(),
            fallback: false,
        }
    }

    #[test]
    fn test_parse_well_formed_file() {
        let parsed = parse_srt(SAMPLE);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].index, "1");
        assert_eq!(parsed.units[0].timestamp_line, "00:00:01,000 --> 00:00:02,000");
        assert_eq!(parsed.units[1].text, "World");
        assert_eq!(parsed.units[1].numbered(), "2.World");
    }

    #[test]
    fn test_multi_line_caption_is_joined_with_spaces() {
        let parsed = parse_srt("7\n00:01:00,000 --> 00:01:02,000\nfirst line\nsecond line\n");
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.units[0].index, "7");
        assert_eq!(parsed.units[0].text, "first line second line");
    }

    #[test]
    fn test_windows_and_mac_line_endings() {
        let windows = SAMPLE.replace('\n', "\r\n");
        let mac = SAMPLE.replace('\n', "\r");
        for content in [windows, mac] {
            let parsed = parse_srt(&content);
            assert_eq!(parsed.units.len(), 2);
            assert_eq!(parsed.units[1].timestamp_line, "00:00:03,000 --> 00:00:04,000");
            assert_eq!(parsed.units[1].text, "World");
        }
    }

    #[test]
    fn test_malformed_entry_is_skipped_and_counted() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n3\ngarbage\n\n4\n00:00:05,000 --> 00:00:06,000\nBye\n";
        let parsed = parse_srt(content);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(
            parsed.timestamps(),
            vec![
                "00:00:01,000 --> 00:00:02,000".to_string(),
                "00:00:05,000 --> 00:00:06,000".to_string()
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_no_units() {
        let parsed = parse_srt("");
        assert!(parsed.units.is_empty());
        assert_eq!(parsed.skipped, 0);

        let parsed = parse_srt("\n\n\n\n");
        assert!(parsed.units.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_reassemble_inserts_timestamp_between_index_and_text() {
        let timestamps = vec![
            "00:00:01,000 --> 00:00:02,000".to_string(),
            "00:00:03,000 --> 00:00:04,000".to_string(),
        ];
        let output = reassemble(&[line("1", "Bonjour"), line("2", "Monde")], &timestamps);
        assert_eq!(
            output,
            "1\n00:00:01,000 --> 00:00:02,000\nBonjour\n\n2\n00:00:03,000 --> 00:00:04,000\nMonde"
        );
    }

    #[test]
    fn test_reassemble_pairs_by_position_when_counts_differ() {
        let timestamps = vec!["A".to_string(), "B".to_string()];

        // Merged response: second timestamp is left unused.
        let merged = reassemble(&[line("1", "one and two")], &timestamps);
        assert_eq!(merged, "1\nA\none and two");

        // Split response: the extra line has no timing and is dropped.
        let split = reassemble(&[line("1", "x"), line("2", "y"), line("3", "z")], &timestamps);
        assert_eq!(split, "1\nA\nx\n\n2\nB\ny");
    }

    #[test]
    fn test_translated_line_display() {
        assert_eq!(line("12", "Hola").to_string(), "12\nHola");
    }

    #[tokio::test]
    async fn test_write_then_read_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.srt");

        write_srt(SAMPLE, &path).await.unwrap();
        assert_eq!(read_srt(&path).await.unwrap(), SAMPLE);

        let missing = read_srt(dir.path().join("missing.srt")).await;
        assert!(matches!(missing, Err(SubtransError::FileNotFound(_))));
    }
}
