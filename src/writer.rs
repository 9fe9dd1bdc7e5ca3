use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;

use crate::entry::HistoryEntry;

/// Render entries to their on-disk text form, in the order given.
///
/// Each entry contributes its verbatim timestamp line (when present) followed
/// by its command body, newline-terminated. Parsing well-formed input and
/// rendering it back is a byte-exact round trip as long as ordering and
/// membership were not changed in between.
pub fn render(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        if let Some(raw) = &entry.raw_timestamp_line {
            out.push_str(raw);
        }
        out.push_str(&entry.command_text);
        if !entry.command_text.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Write rendered entries to `path`, replacing any existing file atomically
pub fn write_atomic<P: AsRef<Path>>(path: P, entries: &[HistoryEntry]) -> Result<()> {
    write_text_atomic(path, &render(entries))
}

/// Atomically replace `path` with `text`.
///
/// The text goes to a temporary file in the destination's own directory and
/// is renamed over the destination, so a concurrent reader sees either the
/// old contents or the new contents, never a half-written file.
pub fn write_text_atomic<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("cannot create temporary file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("cannot write temporary file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| anyhow!("cannot replace {}: {}", path.display(), e.error))?;

    Ok(())
}
