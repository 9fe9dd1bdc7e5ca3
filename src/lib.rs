//! # shell-history-sync
//!
//! A command-line tool for merging and synchronizing timestamped shell
//! history files.
//!
//! ## Overview
//!
//! Bash (with `HISTTIMEFORMAT` set) writes history as `# <epoch-seconds>`
//! tag lines followed by the command, which may span several lines. Two
//! machines sharing a history file, or one machine with redundant copies,
//! quickly end up with divergent histories. `hist-sync` reconciles them
//! without losing data:
//!
//! - **cleanup** strictly parses one or more history files, merges them by
//!   timestamp, drops exact duplicates, and prints the result to stdout.
//!   Malformed input aborts with the file and line number rather than
//!   guessing.
//! - **sync** tolerantly parses a local history and a companion copy,
//!   merges them, backs both files up, and atomically rewrites both with
//!   the merged result. Already-in-sync files are left untouched.
//!
//! Duplicate detection is exact-text only: the same command run at two
//! different times is two entries, and both survive.
//!
//! ## Architecture
//!
//! Raw text flows through the parsers into [`entry::HistoryEntry`] values,
//! through the merge strategies in [`merge`], and back out through
//! [`writer`]; [`sync`] wraps the read/merge/backup/write sequence for the
//! two-file case.

/// The history entry value type and its dedup/ordering keys
pub mod entry;

/// The two history parsers: strict (fail-fast, for cleanup) and tolerant
/// (lossless, for live histories), each with its own tag grammar
pub mod parser;

/// Serialization back to on-disk text, plus atomic file replacement
pub mod writer;

/// Merge strategies: global sort-and-dedupe, and the two-source heuristic
/// that falls back to order-preserving append when timestamps are sparse
pub mod merge;

/// Pre-write backups with timestamp-suffixed names
pub mod backup;

/// The sync orchestrator: read both files, merge, compare, back up, write
pub mod sync;

/// The strict merge-to-stdout pipeline behind the cleanup subcommand
pub mod cleanup;

/// Config directory locations and persisted default paths
pub mod config;

/// Console and file logging setup
pub mod logger;
