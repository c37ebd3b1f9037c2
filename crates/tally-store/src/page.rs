//! Offset-based pagination over a ranked view.
//!
//! Cursors are plain numeric offsets recomputed against the live view on
//! every request. There is no snapshot isolation: writes landing between
//! two page requests can shift an item across a page boundary. That is
//! an accepted property of the design, not a defect.

use serde::{Deserialize, Serialize};
use tally_common::config::LimitsConfig;
use tally_common::RankEntry;

/// Normalized pagination inputs: clamped limit plus starting offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Normalize raw client input. Out-of-range or unparseable values
    /// are clamped to defaults, never rejected.
    #[must_use]
    pub fn normalize(limit: Option<usize>, cursor: Option<&str>, limits: &LimitsConfig) -> Self {
        let limit = limit
            .unwrap_or(limits.top_limit_default)
            .clamp(1, limits.top_limit_max);
        let offset = cursor
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);
        Self { offset, limit }
    }
}

/// One page of ranked rows plus the continuation offset, if any.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<RankEntry>,
    pub next_cursor: Option<usize>,
}

impl Page {
    /// Assemble a page from a view slice. `next_cursor` exists only when
    /// entries remain past `offset + limit`; the last page carries none.
    #[must_use]
    pub fn assemble(rows: Vec<RankEntry>, has_more: bool, request: PageRequest) -> Self {
        let next_cursor = has_more.then(|| request.offset + request.limit);
        Self { rows, next_cursor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn test_normalize_defaults() {
        let req = PageRequest::normalize(None, None, &limits());
        assert_eq!(req, PageRequest { offset: 0, limit: 10 });
    }

    #[test]
    fn test_normalize_clamps_limit() {
        let req = PageRequest::normalize(Some(0), None, &limits());
        assert_eq!(req.limit, 1);
        let req = PageRequest::normalize(Some(10_000), None, &limits());
        assert_eq!(req.limit, 50);
    }

    #[test]
    fn test_normalize_bad_cursor_clamps_to_start() {
        let req = PageRequest::normalize(None, Some("not-a-number"), &limits());
        assert_eq!(req.offset, 0);
        let req = PageRequest::normalize(None, Some(" 25 "), &limits());
        assert_eq!(req.offset, 25);
    }

    #[test]
    fn test_assemble_next_cursor() {
        let request = PageRequest { offset: 10, limit: 5 };
        let page = Page::assemble(Vec::new(), true, request);
        assert_eq!(page.next_cursor, Some(15));

        let page = Page::assemble(Vec::new(), false, request);
        assert_eq!(page.next_cursor, None);
    }
}
