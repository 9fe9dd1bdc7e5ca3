use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::backup::create_backup;
use crate::merge::{merge_two, MergeStats};
use crate::parser::TolerantParser;
use crate::writer::{render, write_text_atomic};

/// What and how to sync
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// The interactive machine's own history file
    pub local: PathBuf,

    /// The companion copy (e.g. a history file on a shared mount)
    pub companion: PathBuf,

    /// Stop after the merge and report what would happen
    pub dry_run: bool,
}

/// How a sync run ended
#[derive(Debug)]
pub enum SyncOutcome {
    /// Both files already hold the merged text; nothing was touched
    AlreadyInSync,

    /// Dry run: merge computed and reported, no backups or writes
    DryRun { stats: MergeStats },

    /// Both files backed up and rewritten with the merged history
    Synced {
        stats: MergeStats,
        local_backup: Option<PathBuf>,
        companion_backup: Option<PathBuf>,
    },
}

/// Drives one sync pass: READ -> MERGE -> COMPARE -> (no-op | BACKUP -> WRITE).
///
/// Reading is tolerant: a live history file can be messy and a missing one
/// just means an empty side. Nothing is written until a backup of every
/// pre-existing file is on disk, and the writes themselves go through a
/// temp-file-and-rename so no crash leaves a half-written history.
pub struct SyncOrchestrator {
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(options: SyncOptions) -> Self {
        SyncOrchestrator { options }
    }

    pub fn run(&self) -> Result<SyncOutcome> {
        let local_path = &self.options.local;
        let companion_path = &self.options.companion;

        for path in [local_path, companion_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("cannot create directory {}", parent.display())
                    })?;
                }
            }
        }

        // READ
        let companion_entries = TolerantParser::parse_file(companion_path)?;
        let local_entries = TolerantParser::parse_file(local_path)?;
        log::debug!(
            "read {} companion entries, {} local entries",
            companion_entries.len(),
            local_entries.len()
        );

        // MERGE: companion is the base side, matching its role as the copy
        // shared between machines
        let (merged, stats) = merge_two(&companion_entries, &local_entries);
        log::info!(
            "merged {} entries ({:?}, {} duplicates dropped)",
            stats.merged_entries,
            stats.strategy,
            stats.duplicates_removed
        );

        // COMPARE: both sides rendered against the merged text
        let merged_text = render(&merged);
        if merged_text == render(&companion_entries) && merged_text == render(&local_entries) {
            return Ok(SyncOutcome::AlreadyInSync);
        }

        if self.options.dry_run {
            return Ok(SyncOutcome::DryRun { stats });
        }

        // BACKUP: both pre-existing files, before either write
        let companion_backup = create_backup(companion_path)?;
        let local_backup = create_backup(local_path)?;

        // WRITE
        write_text_atomic(companion_path, &merged_text)?;
        write_text_atomic(local_path, &merged_text)?;
        log::info!(
            "wrote merged history to {} and {}",
            companion_path.display(),
            local_path.display()
        );

        Ok(SyncOutcome::Synced {
            stats,
            local_backup,
            companion_backup,
        })
    }
}
