//! Redb table definitions for persistent counter storage.

use redb::TableDefinition;

// Key: item id, Value: bincode-encoded Counter
pub const COUNTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("counters");

// Key: metric name ("play"/"download"), Value: bincode-encoded Vec<RankEntry>
pub const RANKS: TableDefinition<&str, &[u8]> = TableDefinition::new("ranks");
