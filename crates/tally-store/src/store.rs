//! Persistent counter store backed by redb.
//!
//! `CounterStore` owns the authoritative counter rows and the per-metric
//! ranked views. Every mutation writes the counter row and the affected
//! view(s) in a single redb write transaction; the in-memory copy of a
//! view is only installed after the transaction commits, so a failed
//! write never leaves a counter incremented with a stale ranking (or the
//! reverse).

use crate::chunk::{dedup_capped, partition};
use crate::page::{Page, PageRequest};
use crate::rank::{RankIndex, RankView};
use crate::tables;
use parking_lot::RwLock;
use redb::{Database, ReadableTable};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tally_common::config::LimitsConfig;
use tally_common::{BulkKind, Counter, Error, ItemId, Metric, RankEntry, Result, clamp_display};
use tracing::{debug, error, info};

/// Internal error type for redb/bincode failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::DatabaseError),
    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("redb transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Transaction(Box::new(e))
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Counts returned for one id by a bulk lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulkValue {
    Single(u64),
    Both { play: u64, download: u64 },
}

/// One row of a bulk lookup result, in first-seen request order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkCount {
    pub id: String,
    pub value: BulkValue,
}

/// Persistent counter store plus in-memory ranked views.
pub struct CounterStore {
    db: Database,
    ranks: RwLock<RankIndex>,
    limits: LimitsConfig,
}

impl CounterStore {
    /// Open (or create) the store at the given path and reload the
    /// persisted ranked views.
    pub fn open(path: impl AsRef<Path>, limits: LimitsConfig) -> Result<Self> {
        let store = Self::open_inner(path.as_ref(), limits)?;
        Ok(store)
    }

    fn open_inner(path: &Path, limits: LimitsConfig) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Create all tables eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(tables::COUNTERS)?;
            let _t = write_txn.open_table(tables::RANKS)?;
        }
        write_txn.commit()?;

        let mut ranks = RankIndex::new(limits.top_cap);
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(tables::RANKS)?;
        for metric in Metric::ALL {
            if let Some(val) = table.get(metric.as_str())? {
                match bincode::deserialize::<Vec<RankEntry>>(val.value()) {
                    Ok(entries) => {
                        ranks.set_view(metric, RankView::from_entries(entries, limits.top_cap));
                    }
                    Err(e) => error!("Failed to decode '{}' ranked view: {}", metric.as_str(), e),
                }
            }
        }
        info!(
            play = ranks.view(Metric::Play).len(),
            download = ranks.view(Metric::Download).len(),
            "Counter store opened"
        );

        Ok(Self {
            db,
            ranks: RwLock::new(ranks),
            limits,
        })
    }

    /// Record one hit for `id` on `metric` and return the updated row.
    ///
    /// Increments the count by exactly one, applies the keep-non-empty
    /// rule to `title`/`file_name`, and moves the id within the metric's
    /// ranked view. Counter row and view commit together or not at all.
    pub fn record_hit(
        &self,
        id: &str,
        metric: Metric,
        title: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Counter> {
        let id = ItemId::new(id)?;
        let title = clamp_display(title);
        let file_name = clamp_display(file_name);
        let now = now_millis();

        let mut ranks = self.ranks.write();
        let (counter, next_view) = self.commit_hit(&id, metric, title, file_name, now, &ranks)?;
        ranks.set_view(metric, next_view);
        debug!(
            id = %counter.id,
            metric = metric.as_str(),
            count = counter.count(metric),
            "Recorded hit"
        );
        Ok(counter)
    }

    fn commit_hit(
        &self,
        id: &ItemId,
        metric: Metric,
        title: Option<String>,
        file_name: Option<String>,
        now: u64,
        ranks: &RankIndex,
    ) -> StoreResult<(Counter, RankView)> {
        let write_txn = self.db.begin_write()?;
        let (counter, next_view) = {
            let mut table = write_txn.open_table(tables::COUNTERS)?;
            let mut counter = match table.get(id.as_str())? {
                Some(val) => bincode::deserialize::<Counter>(val.value())?,
                None => Counter::new(id.as_str().to_string()),
            };
            match metric {
                Metric::Play => counter.play_count += 1,
                Metric::Download => counter.download_count += 1,
            }
            // Non-empty incoming values win; empty ones never erase
            if title.is_some() {
                counter.title = title;
            }
            if file_name.is_some() {
                counter.file_name = file_name;
            }
            counter.updated_at = now.max(counter.updated_at);

            let bytes = bincode::serialize(&counter)?;
            table.insert(id.as_str(), bytes.as_slice())?;

            let next_view = ranks.with_reinsert(metric, RankEntry::from_counter(&counter, metric));
            let view_bytes = bincode::serialize(next_view.entries())?;
            let mut rank_table = write_txn.open_table(tables::RANKS)?;
            rank_table.insert(metric.as_str(), view_bytes.as_slice())?;

            (counter, next_view)
        };
        write_txn.commit()?;
        Ok((counter, next_view))
    }

    /// Current counts for a set of ids.
    ///
    /// Ids are deduplicated preserving first-seen order and capped at
    /// `max_bulk`; lookups run in chunks of at most `chunk_size` per
    /// read pass. Ids never hit before report zero.
    pub fn bulk_get(&self, ids: &[String], kind: BulkKind) -> Result<Vec<BulkCount>> {
        let ids = dedup_capped(ids, self.limits.max_bulk);
        let mut out = Vec::with_capacity(ids.len());
        for chunk in partition(&ids, self.limits.chunk_size) {
            self.bulk_chunk(chunk, kind, &mut out)?;
        }
        Ok(out)
    }

    fn bulk_chunk(
        &self,
        chunk: &[String],
        kind: BulkKind,
        out: &mut Vec<BulkCount>,
    ) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(tables::COUNTERS)?;
        for id in chunk {
            let counter = match table.get(id.as_str())? {
                Some(val) => Some(bincode::deserialize::<Counter>(val.value())?),
                None => None,
            };
            let value = match kind {
                BulkKind::Play => {
                    BulkValue::Single(counter.as_ref().map_or(0, |c| c.play_count))
                }
                BulkKind::Download => {
                    BulkValue::Single(counter.as_ref().map_or(0, |c| c.download_count))
                }
                BulkKind::Both => BulkValue::Both {
                    play: counter.as_ref().map_or(0, |c| c.play_count),
                    download: counter.as_ref().map_or(0, |c| c.download_count),
                },
            };
            out.push(BulkCount {
                id: id.clone(),
                value,
            });
        }
        Ok(())
    }

    /// One page of a metric's ranked view, served from memory.
    #[must_use]
    pub fn top_page(&self, metric: Metric, request: PageRequest) -> Page {
        let ranks = self.ranks.read();
        let (rows, has_more) = ranks.page(metric, request.offset, request.limit);
        Page::assemble(rows, has_more, request)
    }

    /// Delete one counter and drop its id from every metric's view.
    pub fn reset_one(&self, id: &str) -> Result<()> {
        let id = ItemId::new(id)?;
        let mut ranks = self.ranks.write();
        let views = self.commit_reset_one(&id, &ranks)?;
        for (metric, view) in views {
            ranks.set_view(metric, view);
        }
        info!(id = %id, "Counter reset");
        Ok(())
    }

    fn commit_reset_one(
        &self,
        id: &ItemId,
        ranks: &RankIndex,
    ) -> StoreResult<Vec<(Metric, RankView)>> {
        let write_txn = self.db.begin_write()?;
        let views = {
            let mut table = write_txn.open_table(tables::COUNTERS)?;
            table.remove(id.as_str())?;

            let mut rank_table = write_txn.open_table(tables::RANKS)?;
            let mut views = Vec::with_capacity(Metric::ALL.len());
            for metric in Metric::ALL {
                let view = ranks.with_removed(metric, id.as_str());
                let bytes = bincode::serialize(view.entries())?;
                rank_table.insert(metric.as_str(), bytes.as_slice())?;
                views.push((metric, view));
            }
            views
        };
        write_txn.commit()?;
        Ok(views)
    }

    /// Delete every counter and clear every metric's view. Returns the
    /// number of counter rows deleted.
    pub fn reset_all(&self) -> Result<u64> {
        let mut ranks = self.ranks.write();
        let deleted = self.commit_reset_all()?;
        ranks.clear(None);
        info!(deleted, "All counters reset");
        Ok(deleted)
    }

    fn commit_reset_all(&self) -> StoreResult<u64> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let table = write_txn.open_table(tables::COUNTERS)?;
            let mut rows = 0u64;
            for entry in table.iter()? {
                entry?;
                rows += 1;
            }
            rows
        };
        write_txn.delete_table(tables::COUNTERS)?;
        {
            // Recreate the counter table and empty both persisted views
            let _t = write_txn.open_table(tables::COUNTERS)?;
            let mut rank_table = write_txn.open_table(tables::RANKS)?;
            let empty = bincode::serialize(&Vec::<RankEntry>::new())?;
            for metric in Metric::ALL {
                rank_table.insert(metric.as_str(), empty.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Limits this store was opened with
    #[must_use]
    pub const fn limits(&self) -> &LimitsConfig {
        &self.limits
    }
}

/// Current wall clock in unix milliseconds
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
