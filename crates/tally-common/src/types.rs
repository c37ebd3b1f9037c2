//! Core types for Tally
//!
//! Validated identifiers, metric kinds, and the stored counter record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum byte length of an item id
pub const MAX_ITEM_ID_LEN: usize = 256;

/// Maximum character length of display strings (title, file name).
/// Longer input is truncated, not rejected.
pub const MAX_DISPLAY_LEN: usize = 512;

/// A validated item identifier.
///
/// Opaque to the service; the only rules are non-empty, bounded length,
/// and no NUL or other control bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item id (validates identifier rules)
    pub fn new(id: impl Into<String>) -> Result<Self, ItemIdError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the item id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(id: &str) -> Result<(), ItemIdError> {
        if id.is_empty() {
            return Err(ItemIdError::Empty);
        }
        if id.len() > MAX_ITEM_ID_LEN {
            return Err(ItemIdError::TooLong);
        }
        if let Some(c) = id.chars().find(|c| c.is_control()) {
            return Err(ItemIdError::ForbiddenChar(c));
        }
        Ok(())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from item id validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemIdError {
    #[error("item id must not be empty")]
    Empty,
    #[error("item id must be at most {MAX_ITEM_ID_LEN} bytes")]
    TooLong,
    #[error("item id contains forbidden character: {0:?}")]
    ForbiddenChar(char),
}

/// A counted metric. Each metric keeps its own independent ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Play,
    Download,
}

impl Metric {
    /// All metrics, in a fixed order
    pub const ALL: [Self; 2] = [Self::Play, Self::Download];

    /// Stable string form, used as storage key and wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Download => "download",
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Self::Play),
            "download" => Ok(Self::Download),
            other => Err(crate::error::Error::invalid_argument(format!(
                "unknown metric: {other}"
            ))),
        }
    }
}

/// Which counts a bulk lookup should return
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkKind {
    Play,
    Download,
    Both,
}

/// Per-item play/download tally and display metadata.
///
/// Serialized to redb via bincode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: String,
    pub play_count: u64,
    pub download_count: u64,
    pub title: Option<String>,
    pub file_name: Option<String>,
    /// Unix milliseconds of the last mutation
    pub updated_at: u64,
}

impl Counter {
    /// Fresh zeroed counter for an id
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self {
            id,
            play_count: 0,
            download_count: 0,
            title: None,
            file_name: None,
            updated_at: 0,
        }
    }

    /// Count for one metric
    #[must_use]
    pub const fn count(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Play => self.play_count,
            Metric::Download => self.download_count,
        }
    }
}

/// A counter's projection into one metric's ordered view
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub id: String,
    pub count: u64,
    pub updated_at: u64,
    pub title: Option<String>,
    pub file_name: Option<String>,
}

impl RankEntry {
    /// Project a counter into one metric's entry
    #[must_use]
    pub fn from_counter(counter: &Counter, metric: Metric) -> Self {
        Self {
            id: counter.id.clone(),
            count: counter.count(metric),
            updated_at: counter.updated_at,
            title: counter.title.clone(),
            file_name: counter.file_name.clone(),
        }
    }
}

/// Clamp a display string to `MAX_DISPLAY_LEN` characters.
///
/// Empty input maps to `None` so stale values are never overwritten
/// with nothing.
#[must_use]
pub fn clamp_display(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_DISPLAY_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_valid() {
        let id = ItemId::new("track-42").unwrap();
        assert_eq!(id.as_str(), "track-42");
    }

    #[test]
    fn test_item_id_empty() {
        assert_eq!(ItemId::new("").unwrap_err(), ItemIdError::Empty);
    }

    #[test]
    fn test_item_id_too_long() {
        let long = "x".repeat(MAX_ITEM_ID_LEN + 1);
        assert_eq!(ItemId::new(long).unwrap_err(), ItemIdError::TooLong);
    }

    #[test]
    fn test_item_id_forbidden_char() {
        assert_eq!(
            ItemId::new("bad\0id").unwrap_err(),
            ItemIdError::ForbiddenChar('\0')
        );
        assert_eq!(
            ItemId::new("bad\nid").unwrap_err(),
            ItemIdError::ForbiddenChar('\n')
        );
    }

    #[test]
    fn test_metric_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("plays".parse::<Metric>().is_err());
    }

    #[test]
    fn test_clamp_display() {
        assert_eq!(clamp_display(None), None);
        assert_eq!(clamp_display(Some("")), None);
        assert_eq!(clamp_display(Some("  ")), None);
        assert_eq!(clamp_display(Some("Song A")), Some("Song A".to_string()));

        let long = "y".repeat(MAX_DISPLAY_LEN + 100);
        let clamped = clamp_display(Some(&long)).unwrap();
        assert_eq!(clamped.chars().count(), MAX_DISPLAY_LEN);
    }

    #[test]
    fn test_counter_count_per_metric() {
        let mut counter = Counter::new("a".into());
        counter.play_count = 3;
        counter.download_count = 7;
        assert_eq!(counter.count(Metric::Play), 3);
        assert_eq!(counter.count(Metric::Download), 7);
    }
}
