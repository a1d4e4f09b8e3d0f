//! Span merge pass
//!
//! Coalesces immediately adjacent `ok` entries with the same identity into a
//! single span, then renumbers the result 1..k. Single left-to-right pass, no
//! backtracking: a repeat separated by any other entry stays separate.

use mixid_common::{TrackEntry, Tracklist};

/// Merge adjacent identical `ok` entries and renumber
pub fn merge_spans(entries: Vec<TrackEntry>) -> Tracklist {
    let mut merged: Tracklist = Vec::with_capacity(entries.len());

    for entry in entries {
        if let Some(last) = merged.last_mut() {
            if entry.is_ok() && last.is_ok() && last.identity() == entry.identity() {
                last.chunk_seconds[1] = entry.chunk_seconds[1];
                continue;
            }
        }
        merged.push(entry);
    }

    renumber(&mut merged);
    merged
}

/// Rewrite `order` as 1..k in list order
pub fn renumber(entries: &mut [TrackEntry]) {
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.order = position as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixid_common::TrackStatus;

    #[test]
    fn test_contiguous_merge() {
        let merged = merge_spans(vec![
            TrackEntry::identified(1, [0, 10], "A", "X"),
            TrackEntry::identified(2, [10, 20], "A", "X"),
            TrackEntry::identified(3, [20, 30], "B", "Y"),
        ]);

        assert_eq!(
            merged,
            vec![
                TrackEntry::identified(1, [0, 20], "A", "X"),
                TrackEntry::identified(2, [20, 30], "B", "Y"),
            ]
        );
    }

    #[test]
    fn test_only_adjacent_entries_merge() {
        let merged = merge_spans(vec![
            TrackEntry::identified(1, [0, 10], "A", "X"),
            TrackEntry::not_found(2, [10, 20]),
            TrackEntry::identified(3, [20, 30], "A", "X"),
        ]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].chunk_seconds, [0, 10]);
        assert_eq!(merged[2].chunk_seconds, [20, 30]);
    }

    #[test]
    fn test_non_ok_entries_never_merge() {
        let merged = merge_spans(vec![
            TrackEntry::not_found(1, [0, 10]),
            TrackEntry::not_found(2, [10, 20]),
            TrackEntry::error(3, [20, 30], "timeout"),
            TrackEntry::error(4, [30, 40], "timeout"),
        ]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_long_run_collapses_to_one_span() {
        let entries = (0..6u32)
            .map(|i| TrackEntry::identified(i + 1, [u64::from(i) * 10, u64::from(i + 1) * 10], "A", "X"))
            .collect();
        let merged = merge_spans(entries);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].chunk_seconds, [0, 60]);
        assert_eq!(merged[0].status, TrackStatus::Ok);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_spans(vec![
            TrackEntry::identified(1, [0, 10], "A", "X"),
            TrackEntry::identified(2, [10, 20], "A", "X"),
            TrackEntry::duplicate_or_unknown(3, [20, 30]),
            TrackEntry::identified(4, [30, 40], "B", "Y"),
            TrackEntry::identified(5, [40, 50], "B", "Y"),
            TrackEntry::not_found(6, [50, 60]),
        ]);
        let twice = merge_spans(once.clone());

        assert_eq!(once, twice);
        let orders: Vec<u32> = once.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_spans(Vec::new()).is_empty());
    }
}
