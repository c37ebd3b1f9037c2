//! Pure helpers for bulk id handling.
//!
//! Bulk lookups dedup their id set, cap it, and walk the store in
//! bounded chunks so no single read pass exceeds the storage layer's
//! comfortable query size. Kept free of store types so the rules are
//! independently testable.

use std::collections::HashSet;

/// Deduplicate ids preserving first-seen order, dropping everything
/// past `cap`. Excess ids are silently dropped, never an error.
#[must_use]
pub fn dedup_capped(ids: &[String], cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if out.len() >= cap {
            break;
        }
        if seen.insert(id.as_str()) {
            out.push(id.clone());
        }
    }
    out
}

/// Split a slice into chunks of at most `chunk_size` items.
///
/// A `chunk_size` of zero is treated as one big chunk rather than
/// looping forever.
#[must_use]
pub fn partition<T>(items: &[T], chunk_size: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![items];
    }
    items.chunks(chunk_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let ids = strings(&["b", "a", "b", "c", "a"]);
        assert_eq!(dedup_capped(&ids, 10), strings(&["b", "a", "c"]));
    }

    #[test]
    fn test_dedup_cap_drops_excess() {
        let ids: Vec<String> = (0..1000).map(|i| format!("id{}", i % 900)).collect();
        let out = dedup_capped(&ids, 600);
        assert_eq!(out.len(), 600);
        assert_eq!(out[0], "id0");
        assert_eq!(out[599], "id599");
    }

    #[test]
    fn test_partition_exact_and_remainder() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = partition(&items, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 4);
        assert_eq!(chunks[2].len(), 2);

        let chunks = partition(&items, 5);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 5));
    }

    #[test]
    fn test_partition_empty_and_zero_chunk() {
        let items: Vec<u32> = Vec::new();
        assert!(partition(&items, 4).is_empty());

        let items: Vec<u32> = (0..3).collect();
        let chunks = partition(&items, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 3);
    }

    #[test]
    fn test_partition_never_exceeds_chunk_size() {
        let items: Vec<u32> = (0..601).collect();
        for chunk in partition(&items, 450) {
            assert!(chunk.len() <= 450);
        }
    }
}
