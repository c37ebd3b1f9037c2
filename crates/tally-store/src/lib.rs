//! Tally Store - counter persistence and ranking engine
//!
//! This crate owns the authoritative per-item counters (redb-backed) and
//! the bounded per-metric ranked views used for top listings.

pub mod chunk;
pub mod page;
pub mod rank;
pub mod store;
mod tables;

// Re-exports
pub use page::{Page, PageRequest};
pub use rank::RankIndex;
pub use store::{BulkCount, BulkValue, CounterStore};
