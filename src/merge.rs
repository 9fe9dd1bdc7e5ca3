use std::collections::HashSet;

use crate::entry::HistoryEntry;

/// Both sides of a two-source merge must be at least this timestamped for
/// the timestamp-ordered strategy to be trusted
const MOSTLY_TIMESTAMPED: f64 = 0.9;

/// Which strategy a two-source merge ended up using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Both sources were mostly timestamped; merged by ascending timestamp
    Timestamp,
    /// At least one source was not mostly timestamped; base order kept,
    /// unseen incoming entries appended
    ConservativeAppend,
}

/// Statistics about a two-source merge
#[derive(Debug, Clone)]
pub struct MergeStats {
    /// Number of entries parsed from the base source
    pub base_entries: usize,

    /// Number of entries parsed from the incoming source
    pub incoming_entries: usize,

    /// Number of entries in the merged result
    pub merged_entries: usize,

    /// Number of exact-text duplicates dropped
    pub duplicates_removed: usize,

    /// Strategy the merge ran under
    pub strategy: MergeStrategy,
}

/// Merge any number of sources into one stream: concatenate, stable-sort by
/// `(timestamp, source order)`, and keep the first occurrence of each
/// exact-text key.
///
/// This is the cleanup semantics: the sources are redundant copies of one
/// logical stream, so a global timestamp ordering is correct.
pub fn merge_sorted(sources: Vec<Vec<HistoryEntry>>) -> Vec<HistoryEntry> {
    let mut all: Vec<HistoryEntry> = sources.into_iter().flatten().collect();
    all.sort_by_key(HistoryEntry::sort_key);

    let mut seen = HashSet::new();
    all.into_iter()
        .filter(|entry| seen.insert(entry.text_key()))
        .collect()
}

/// Reconcile two histories that may have diverged.
///
/// When both sides are mostly timestamped (>= 90% of entries tagged), the
/// result is a stable two-way merge by ascending timestamp, preferring the
/// base side on ties and dropping exact-text duplicates as they are emitted.
///
/// Otherwise timestamps cannot be trusted as a total order, so the base
/// source keeps its order untouched and each incoming entry whose exact text
/// is not already present is appended in its original order. Reordering an
/// untimestamped log would corrupt it; a little redundancy is the cheaper
/// failure.
pub fn merge_two(base: &[HistoryEntry], incoming: &[HistoryEntry]) -> (Vec<HistoryEntry>, MergeStats) {
    let strategy = if timestamped_fraction(base) >= MOSTLY_TIMESTAMPED
        && timestamped_fraction(incoming) >= MOSTLY_TIMESTAMPED
    {
        MergeStrategy::Timestamp
    } else {
        MergeStrategy::ConservativeAppend
    };

    let (merged, duplicates_removed) = match strategy {
        MergeStrategy::Timestamp => merge_by_timestamp(base, incoming),
        MergeStrategy::ConservativeAppend => merge_conservative(base, incoming),
    };

    let stats = MergeStats {
        base_entries: base.len(),
        incoming_entries: incoming.len(),
        merged_entries: merged.len(),
        duplicates_removed,
        strategy,
    };

    (merged, stats)
}

fn timestamped_fraction(entries: &[HistoryEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let tagged = entries.iter().filter(|e| e.has_timestamp()).count();
    tagged as f64 / entries.len() as f64
}

/// Merge keys for the timestamp strategy. An entry without its own timestamp
/// inherits the one carried forward from the previous entry of the same
/// source, keeping it next to its neighbors; entries before any tag sort
/// first.
fn effective_timestamps(entries: &[HistoryEntry]) -> Vec<i64> {
    let mut keys = Vec::with_capacity(entries.len());
    let mut last = i64::MIN;
    for entry in entries {
        if let Some(ts) = entry.timestamp {
            last = ts;
        }
        keys.push(last);
    }
    keys
}

fn merge_by_timestamp(
    base: &[HistoryEntry],
    incoming: &[HistoryEntry],
) -> (Vec<HistoryEntry>, usize) {
    let base_keys = effective_timestamps(base);
    let incoming_keys = effective_timestamps(incoming);

    let mut merged = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let (mut i, mut j) = (0, 0);

    while i < base.len() || j < incoming.len() {
        let pick_base = if i < base.len() && j < incoming.len() {
            base_keys[i] <= incoming_keys[j]
        } else {
            i < base.len()
        };

        let entry = if pick_base {
            i += 1;
            &base[i - 1]
        } else {
            j += 1;
            &incoming[j - 1]
        };

        if seen.insert(entry.text_key()) {
            merged.push(entry.clone());
        } else {
            duplicates += 1;
        }
    }

    (merged, duplicates)
}

fn merge_conservative(
    base: &[HistoryEntry],
    incoming: &[HistoryEntry],
) -> (Vec<HistoryEntry>, usize) {
    let mut merged: Vec<HistoryEntry> = base.to_vec();
    let mut seen: HashSet<String> = merged.iter().map(HistoryEntry::text_key).collect();
    let mut duplicates = 0;

    for entry in incoming {
        if seen.insert(entry.text_key()) {
            merged.push(entry.clone());
        } else {
            duplicates += 1;
        }
    }

    (merged, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::render;

    fn tagged(ts: i64, cmd: &str, order: usize) -> HistoryEntry {
        HistoryEntry::tagged(ts, format!("# {ts}\n"), format!("{cmd}\n"), order)
    }

    fn untagged(cmd: &str, order: usize) -> HistoryEntry {
        HistoryEntry::untagged(format!("{cmd}\n"), order)
    }

    #[test]
    fn test_merge_sorted_orders_by_timestamp() {
        let a = vec![tagged(3000, "c", 0), tagged(1000, "a", 1)];
        let b = vec![tagged(2000, "b", 0)];

        let merged = merge_sorted(vec![a, b]);
        let timestamps: Vec<_> = merged.iter().map(|e| e.timestamp.unwrap()).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_merge_sorted_drops_exact_duplicates_only() {
        let a = vec![tagged(1000, "make", 0), tagged(2000, "make", 1)];
        let b = vec![tagged(1000, "make", 0)];

        let merged = merge_sorted(vec![a, b]);
        // The 1000/make pair is an exact duplicate; the 2000/make entry is
        // the same command at a different time and must survive
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].timestamp, Some(1000));
        assert_eq!(merged[1].timestamp, Some(2000));
    }

    #[test]
    fn test_merge_sorted_stable_on_equal_keys() {
        let a = vec![tagged(1000, "first", 0)];
        let b = vec![tagged(1000, "second", 0)];

        let merged = merge_sorted(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].command_text, "first\n");
        assert_eq!(merged[1].command_text, "second\n");
    }

    #[test]
    fn test_merge_two_timestamp_strategy_interleaves() {
        let base = vec![tagged(1000, "a", 0), tagged(3000, "c", 1)];
        let incoming = vec![tagged(2000, "b", 0), tagged(4000, "d", 1)];

        let (merged, stats) = merge_two(&base, &incoming);
        assert_eq!(stats.strategy, MergeStrategy::Timestamp);
        let cmds: Vec<_> = merged.iter().map(|e| e.command_text.trim()).collect();
        assert_eq!(cmds, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_two_timestamp_tie_prefers_base() {
        let base = vec![tagged(1000, "base", 0)];
        let incoming = vec![tagged(1000, "incoming", 0)];

        let (merged, _) = merge_two(&base, &incoming);
        assert_eq!(merged[0].command_text, "base\n");
        assert_eq!(merged[1].command_text, "incoming\n");
    }

    #[test]
    fn test_merge_two_drops_duplicates_and_counts_them() {
        let base = vec![tagged(1000, "a", 0), tagged(2000, "b", 1)];
        let incoming = vec![tagged(1000, "a", 0), tagged(3000, "c", 1)];

        let (merged, stats) = merge_two(&base, &incoming);
        assert_eq!(merged.len(), 3);
        assert_eq!(stats.duplicates_removed, 1);
        assert_eq!(stats.merged_entries, 3);
    }

    #[test]
    fn test_merge_two_idempotent_on_identical_sources() {
        let source = vec![tagged(1000, "a", 0), tagged(2000, "b", 1)];

        let (merged, _) = merge_two(&source, &source);
        assert_eq!(render(&merged), render(&source));
    }

    #[test]
    fn test_merge_two_untimestamped_entry_keeps_neighborhood() {
        // One untagged entry out of ten keeps both sides above the 90%
        // threshold; it must merge next to its in-source predecessor.
        let mut base: Vec<HistoryEntry> = (0..9).map(|k| tagged(1000 + k, "b", k as usize)).collect();
        base.insert(5, untagged("between", 9));
        let incoming = vec![tagged(5000, "other", 0)];

        let (merged, stats) = merge_two(&base, &incoming);
        assert_eq!(stats.strategy, MergeStrategy::Timestamp);
        let pos_prev = merged
            .iter()
            .position(|e| e.timestamp == Some(1004))
            .unwrap();
        assert_eq!(merged[pos_prev + 1].command_text, "between\n");
    }

    #[test]
    fn test_merge_two_conservative_keeps_base_order() {
        let base = vec![untagged("z", 0), untagged("a", 1)];
        let incoming = vec![untagged("m", 0), untagged("a", 1)];

        let (merged, stats) = merge_two(&base, &incoming);
        assert_eq!(stats.strategy, MergeStrategy::ConservativeAppend);
        let cmds: Vec<_> = merged.iter().map(|e| e.command_text.trim()).collect();
        // Base order untouched, only the unseen incoming entry appended
        assert_eq!(cmds, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_merge_two_conservative_loses_nothing() {
        let base = vec![tagged(1000, "a", 0), untagged("plain", 1)];
        let incoming = vec![untagged("other", 0), tagged(500, "b", 1)];

        let (merged, _) = merge_two(&base, &incoming);
        let keys: HashSet<String> = merged.iter().map(HistoryEntry::text_key).collect();
        for entry in base.iter().chain(incoming.iter()) {
            assert!(keys.contains(&entry.text_key()));
        }
    }

    #[test]
    fn test_merge_two_mixed_coverage_falls_back_to_conservative() {
        // Base is fully tagged but incoming is only half tagged
        let base = vec![tagged(1000, "a", 0), tagged(2000, "b", 1)];
        let incoming = vec![tagged(1500, "c", 0), untagged("d", 1)];

        let (_, stats) = merge_two(&base, &incoming);
        assert_eq!(stats.strategy, MergeStrategy::ConservativeAppend);
    }

    #[test]
    fn test_merge_two_empty_sides() {
        let source = vec![tagged(1000, "a", 0)];

        let (merged, stats) = merge_two(&[], &source);
        assert_eq!(merged.len(), 1);
        // An empty side counts as not mostly timestamped
        assert_eq!(stats.strategy, MergeStrategy::ConservativeAppend);

        let (merged, _) = merge_two(&source, &[]);
        assert_eq!(merged.len(), 1);
    }
}
