/// Represents a single logical record in a shell history file
///
/// An entry is an optional timestamp tag plus the command body that follows
/// it. The body may span several lines (multi-line shell constructs come out
/// of `history -w` exactly like that). Entries are plain values: they are
/// built fresh on every parse and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Epoch seconds parsed from the timestamp tag, if one was present
    pub timestamp: Option<i64>,

    /// The exact original tag line, prefix and trailing newline included.
    /// Kept verbatim so serialization round-trips byte for byte.
    pub raw_timestamp_line: Option<String>,

    /// The command body; may contain embedded newlines
    pub command_text: String,

    /// Zero-based position of this entry within its source file, used as a
    /// stable tie-break when timestamps are equal or absent
    pub sequence_order: usize,
}

impl HistoryEntry {
    /// Creates an entry backed by a recognized timestamp tag line
    pub fn tagged(
        timestamp: i64,
        raw_timestamp_line: String,
        command_text: String,
        sequence_order: usize,
    ) -> Self {
        HistoryEntry {
            timestamp: Some(timestamp),
            raw_timestamp_line: Some(raw_timestamp_line),
            command_text,
            sequence_order,
        }
    }

    /// Creates an entry with no timestamp tag
    pub fn untagged(command_text: String, sequence_order: usize) -> Self {
        HistoryEntry {
            timestamp: None,
            raw_timestamp_line: None,
            command_text,
            sequence_order,
        }
    }

    /// Exact-text key used for duplicate detection: the verbatim tag line
    /// (when present) concatenated with the command body.
    ///
    /// Deduplication is deliberately conservative. Two entries are duplicates
    /// only when their full text is identical; the same command issued at a
    /// different time is a distinct entry and is kept.
    pub fn text_key(&self) -> String {
        match &self.raw_timestamp_line {
            Some(raw) => format!("{raw}{}", self.command_text),
            None => self.command_text.clone(),
        }
    }

    /// Ordering key for sort-based merging: timestamp ascending, with
    /// untimestamped entries sorting last, then source position.
    pub fn sort_key(&self) -> (i64, usize) {
        (self.timestamp.unwrap_or(i64::MAX), self.sequence_order)
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }
}
