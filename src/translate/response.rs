use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::subtitle::{TranslatedLine, normalize_newlines};

// ASCII digits only: `\d` would also accept other scripts' digits, which are
// not valid SRT entry numbers.
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.\s*(.+)$").expect("numbered line pattern is valid"));

#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub lines: Vec<TranslatedLine>,
    /// Lines that lacked numbering and received a positional index
    pub fallback_count: usize,
}

/// Split a completion into one translated line per response line.
///
/// Lines matching `N. text` keep their number. Anything else gets its 1-based
/// position as a synthetic index.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let normalized = normalize_newlines(raw);
    let mut parsed = ParsedResponse::default();

    for (position, line) in normalized.trim().split('\n').enumerate() {
        let line = line.trim();

        match NUMBERED_LINE.captures(line) {
            Some(caps) => parsed.lines.push(TranslatedLine {
                index: caps[1].to_string(),
                text: caps[2].to_string(),
                fallback: false,
            }),
            None => {
                warn!("Could not parse translated line at position {}: {:?}", position, line);
                parsed.fallback_count += 1;
                parsed.lines.push(TranslatedLine {
                    index: (position + 1).to_string(),
                    text: line.to_string(),
                    fallback: true,
                });
            }
        }
    }

    parsed
}
