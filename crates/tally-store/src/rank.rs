//! Bounded per-metric ranked views.
//!
//! Each metric keeps a sorted, capped list of entries, updated in place
//! on every write instead of re-scanning the counter population. Cap
//! sizes are in the hundreds, so remove + binary-search insert is cheap
//! and keeps the deterministic order pagination depends on.

use std::cmp::Ordering;
use tally_common::{Metric, RankEntry};

/// Total order over rank entries: count descending, then most recently
/// updated first, then id ascending as the final deterministic tie-break.
fn rank_cmp(a: &RankEntry, b: &RankEntry) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// One metric's ordered view: sorted by `rank_cmp`, at most `cap` entries.
#[derive(Clone, Debug, Default)]
pub struct RankView {
    entries: Vec<RankEntry>,
}

impl RankView {
    /// Build a view from persisted entries, restoring order and cap.
    #[must_use]
    pub fn from_entries(mut entries: Vec<RankEntry>, cap: usize) -> Self {
        entries.sort_by(rank_cmp);
        entries.truncate(cap);
        Self { entries }
    }

    /// Replace any existing entry for this id, insert at the sorted
    /// position, and drop whatever falls past the cap. Eviction is
    /// final: a dropped id is only re-admitted by a later hit that
    /// ranks it above the current tail.
    pub fn reinsert(&mut self, entry: RankEntry, cap: usize) {
        self.entries.retain(|e| e.id != entry.id);
        let pos = self
            .entries
            .binary_search_by(|e| rank_cmp(e, &entry))
            .unwrap_or_else(|pos| pos);
        self.entries.insert(pos, entry);
        self.entries.truncate(cap);
    }

    /// Remove an id from the view; returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Slice `[offset, offset + limit)` plus whether more entries follow.
    #[must_use]
    pub fn page(&self, offset: usize, limit: usize) -> (Vec<RankEntry>, bool) {
        let start = offset.min(self.entries.len());
        let end = offset.saturating_add(limit).min(self.entries.len());
        let rows = self.entries[start..end].to_vec();
        let has_more = end < self.entries.len();
        (rows, has_more)
    }

    #[must_use]
    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ranked views for all metrics. Never originates counts; it only
/// mirrors what `CounterStore` writes through it.
#[derive(Clone, Debug)]
pub struct RankIndex {
    play: RankView,
    download: RankView,
    cap: usize,
}

impl RankIndex {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            play: RankView::default(),
            download: RankView::default(),
            cap,
        }
    }

    #[must_use]
    pub const fn view(&self, metric: Metric) -> &RankView {
        match metric {
            Metric::Play => &self.play,
            Metric::Download => &self.download,
        }
    }

    /// Install a freshly committed view for one metric.
    pub fn set_view(&mut self, metric: Metric, view: RankView) {
        match metric {
            Metric::Play => self.play = view,
            Metric::Download => self.download = view,
        }
    }

    /// Clone one metric's view, apply a reinsert, and return it. The
    /// caller persists the result before installing it via `set_view`,
    /// so a failed commit leaves the live view untouched.
    #[must_use]
    pub fn with_reinsert(&self, metric: Metric, entry: RankEntry) -> RankView {
        let mut next = self.view(metric).clone();
        next.reinsert(entry, self.cap);
        next
    }

    /// Clone one metric's view with an id removed.
    #[must_use]
    pub fn with_removed(&self, metric: Metric, id: &str) -> RankView {
        let mut next = self.view(metric).clone();
        next.remove(id);
        next
    }

    /// Drop one or all metrics' views.
    pub fn clear(&mut self, metric: Option<Metric>) {
        match metric {
            Some(Metric::Play) => self.play = RankView::default(),
            Some(Metric::Download) => self.download = RankView::default(),
            None => {
                self.play = RankView::default();
                self.download = RankView::default();
            }
        }
    }

    #[must_use]
    pub fn page(&self, metric: Metric, offset: usize, limit: usize) -> (Vec<RankEntry>, bool) {
        self.view(metric).page(offset, limit)
    }

    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, count: u64, updated_at: u64) -> RankEntry {
        RankEntry {
            id: id.to_string(),
            count,
            updated_at,
            title: None,
            file_name: None,
        }
    }

    fn ids(view: &RankView) -> Vec<&str> {
        view.entries().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_order_count_desc() {
        let mut view = RankView::default();
        view.reinsert(entry("a", 3, 100), 10);
        view.reinsert(entry("b", 5, 100), 10);
        view.reinsert(entry("c", 1, 100), 10);
        assert_eq!(ids(&view), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_tie_break_updated_at_then_id() {
        let mut view = RankView::default();
        view.reinsert(entry("late", 5, 200), 10);
        view.reinsert(entry("early", 5, 100), 10);
        // Same count: newer update ranks first
        assert_eq!(ids(&view), vec!["late", "early"]);

        view.reinsert(entry("b", 5, 200), 10);
        // Same count and timestamp: id ascending
        assert_eq!(ids(&view), vec!["b", "late", "early"]);
    }

    #[test]
    fn test_reinsert_replaces_existing() {
        let mut view = RankView::default();
        view.reinsert(entry("a", 1, 100), 10);
        view.reinsert(entry("b", 2, 100), 10);
        view.reinsert(entry("a", 3, 150), 10);
        assert_eq!(ids(&view), vec!["a", "b"]);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_cap_eviction() {
        let mut view = RankView::default();
        for i in 0..5u64 {
            view.reinsert(entry(&format!("id{i}"), i + 1, 100), 3);
        }
        assert_eq!(view.len(), 3);
        assert_eq!(ids(&view), vec!["id4", "id3", "id2"]);

        // Evicted id only comes back via a hit that outranks the tail
        view.reinsert(entry("id0", 2, 300), 3);
        assert_eq!(ids(&view), vec!["id4", "id3", "id2"]);
        view.reinsert(entry("id0", 4, 300), 3);
        assert_eq!(ids(&view), vec!["id4", "id0", "id3"]);
    }

    #[test]
    fn test_ordering_invariant_holds_after_random_writes() {
        let mut view = RankView::default();
        for i in 0..50u64 {
            let id = format!("id{}", i % 17);
            view.reinsert(entry(&id, (i * 7) % 23, (i * 13) % 31), 12);
        }
        assert!(view.len() <= 12);
        for pair in view.entries().windows(2) {
            assert_ne!(rank_cmp(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_page_slicing() {
        let mut view = RankView::default();
        for i in 0..5u64 {
            view.reinsert(entry(&format!("id{i}"), 10 - i, 100), 10);
        }
        let (rows, has_more) = view.page(0, 2);
        assert_eq!(rows.len(), 2);
        assert!(has_more);

        let (rows, has_more) = view.page(4, 2);
        assert_eq!(rows.len(), 1);
        assert!(!has_more);

        let (rows, has_more) = view.page(10, 2);
        assert!(rows.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn test_from_entries_restores_order() {
        let view = RankView::from_entries(
            vec![entry("low", 1, 10), entry("high", 9, 10), entry("mid", 5, 10)],
            2,
        );
        assert_eq!(ids(&view), vec!["high", "mid"]);
    }

    #[test]
    fn test_index_clear() {
        let mut index = RankIndex::new(10);
        let play = index.with_reinsert(Metric::Play, entry("a", 1, 10));
        index.set_view(Metric::Play, play);
        let dl = index.with_reinsert(Metric::Download, entry("a", 1, 10));
        index.set_view(Metric::Download, dl);

        index.clear(Some(Metric::Play));
        assert!(index.view(Metric::Play).is_empty());
        assert!(!index.view(Metric::Download).is_empty());

        index.clear(None);
        assert!(index.view(Metric::Download).is_empty());
    }
}
