use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::entry::HistoryEntry;

/// A strict-grammar violation, reported with the offending file and 1-based
/// line number. These are never recovered from; the caller is expected to
/// fix the source file by hand.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("non-timestamped line in {path} at line {line}")]
    NotTimestamped { path: String, line: usize },

    #[error("empty command for timestamp in {path} at line {line}")]
    EmptyCommand { path: String, line: usize },

    #[error("malformed timestamp in {path} at line {line}")]
    MalformedTimestamp { path: String, line: usize },
}

/// Common interface for the two history parsers.
///
/// The strict and tolerant variants recognize timestamp tag lines with
/// different grammars, and each serialization round-trip guarantee depends
/// on its own grammar. They are kept as separate types implementing this
/// trait rather than one parser with a mode flag.
pub trait ParseHistory {
    fn parse(&self, text: &str, source: &Path) -> Result<Vec<HistoryEntry>, ParseError>;
}

/// Parser for well-formed timestamped history.
///
/// Input must be a sequence of blocks, each exactly one timestamp tag line
/// followed by one or more command lines. A tag line is `#`, optional
/// whitespace, one or more decimal digits, then only whitespace to end of
/// line. Any violation is a hard [`ParseError`] and no entries are produced.
pub struct StrictParser;

/// Parser for live interactive history, which may be messy.
///
/// Never fails: a tag line is the literal prefix `"# "` whose remainder
/// parses as an integer, and anything else is command text. Malformed tags
/// are folded into an untimestamped entry's body, so every byte of input
/// survives into some entry.
pub struct TolerantParser;

impl StrictParser {
    /// Parse a history file, failing on the first grammar violation
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryEntry>> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let text = String::from_utf8_lossy(&data);
        Ok(StrictParser.parse(&text, path)?)
    }
}

impl ParseHistory for StrictParser {
    fn parse(&self, text: &str, source: &Path) -> Result<Vec<HistoryEntry>, ParseError> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut entries = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let lineno = i + 1;
            let line = lines[i];

            if !is_strict_tag_line(line) {
                return Err(ParseError::NotTimestamped {
                    path: source.display().to_string(),
                    line: lineno,
                });
            }

            let timestamp = parse_strict_epoch(line, source, lineno)?;
            let raw_line = line.to_string();

            // Gather command lines until the next tag line or end of input
            i += 1;
            let start = i;
            while i < lines.len() && !is_strict_tag_line(lines[i]) {
                i += 1;
            }

            if i == start {
                return Err(ParseError::EmptyCommand {
                    path: source.display().to_string(),
                    line: lineno,
                });
            }

            let mut command = lines[start..i].concat();
            if !command.ends_with('\n') {
                command.push('\n');
            }

            let order = entries.len();
            entries.push(HistoryEntry::tagged(timestamp, raw_line, command, order));
        }

        Ok(entries)
    }
}

impl TolerantParser {
    /// Parse a history file; a missing file is an empty history, not an error
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryEntry>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let text = String::from_utf8_lossy(&data);
        // The tolerant grammar has no failure states
        Ok(TolerantParser.parse(&text, path).unwrap_or_default())
    }
}

impl ParseHistory for TolerantParser {
    fn parse(&self, text: &str, _source: &Path) -> Result<Vec<HistoryEntry>, ParseError> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut entries: Vec<HistoryEntry> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            if let Some(timestamp) = parse_tolerant_tag(line) {
                let raw_line = line.to_string();
                i += 1;
                let start = i;
                while i < lines.len() && !lines[i].starts_with("# ") {
                    i += 1;
                }
                // Body may legitimately be empty here (tag at EOF, or two
                // adjacent tags); tolerant mode keeps the entry anyway.
                let command = lines[start..i].concat();
                let order = entries.len();
                entries.push(HistoryEntry::tagged(timestamp, raw_line, command, order));
            } else {
                // Either a plain command line or a line that looks like a tag
                // but does not parse as one. Both start an untimestamped
                // entry running to the next "# " boundary.
                let start = i;
                i += 1;
                while i < lines.len() && !lines[i].starts_with("# ") {
                    i += 1;
                }
                let command = lines[start..i].concat();
                let order = entries.len();
                entries.push(HistoryEntry::untagged(command, order));
            }
        }

        Ok(entries)
    }
}

/// Strict tag grammar: `#`, optional whitespace, at least one decimal digit,
/// then only whitespace (including the line terminator) to end of line.
fn is_strict_tag_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('#') else {
        return false;
    };
    let rest = rest.trim_start();
    let after_digits = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let digit_count = rest.len() - after_digits.len();
    digit_count > 0 && after_digits.chars().all(char::is_whitespace)
}

/// Extract the epoch value from a line already known to match the strict tag
/// grammar. Conversion can still fail when the digit run overflows.
fn parse_strict_epoch(line: &str, source: &Path, lineno: usize) -> Result<i64, ParseError> {
    let rest = line[1..].trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end]
        .parse::<i64>()
        .map_err(|_| ParseError::MalformedTimestamp {
            path: source.display().to_string(),
            line: lineno,
        })
}

/// Tolerant tag grammar: the literal prefix `"# "` with a remainder that
/// parses as a plain integer. Note this is narrower about the prefix and
/// wider about the number than the strict grammar; the two are intentionally
/// not unified.
fn parse_tolerant_tag(line: &str) -> Option<i64> {
    line.strip_prefix("# ")?.trim().parse::<i64>().ok()
}
