use anyhow::Result;
use std::path::PathBuf;

use crate::merge::merge_sorted;
use crate::parser::StrictParser;
use crate::writer::render;

/// Strict-merge any number of history files into one deduplicated stream.
///
/// Every file is parsed before any text is produced, so a malformed input
/// (reported with its file and line) yields an error and zero output rather
/// than a truncated stream. The result is ordered by timestamp and free of
/// exact-text duplicates.
pub fn merge_files(files: &[PathBuf]) -> Result<String> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let entries = StrictParser::parse_file(file)?;
        log::debug!("parsed {} entries from {}", entries.len(), file.display());
        sources.push(entries);
    }

    Ok(render(&merge_sorted(sources)))
}
