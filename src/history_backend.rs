//! Persistence backend contract.
//!
//! The history store talks to durable storage only through [`HistoryBackend`].
//! [`crate::lmdb_backend::LmdbBackend`] is the on-device implementation;
//! [`MemoryBackend`] keeps everything in process memory.

use uuid::Uuid;

use crate::error::{HistoryError, Result};
use crate::history_model::BenchmarkRecord;

/// Durable storage for benchmark records, keyed by record id.
///
/// Implementations must be `Send` so the store can be driven from a background
/// thread. Each call is expected to be atomic on its own; ordering several calls
/// into one unit is the store's job.
pub trait HistoryBackend: Send {
    /// Adds a new record. Fails with [`HistoryError::StorageFailure`] on I/O
    /// errors or if the id is already present.
    fn insert(&mut self, record: &BenchmarkRecord) -> Result<()>;

    /// Returns every record, newest first. Must reflect all prior successful
    /// inserts and deletes.
    fn fetch_all(&self) -> Result<Vec<BenchmarkRecord>>;

    /// Removes the record with `id`. A missing id is not an error.
    fn delete_by_id(&mut self, id: &Uuid) -> Result<()>;

    /// Removes every record, all or nothing.
    fn delete_all(&mut self) -> Result<()>;

    /// Commits buffered writes durably.
    fn flush(&mut self) -> Result<()>;
}

/// Sorts records by date, newest first. The sort is stable, so records with
/// the same date keep the backend's order.
pub fn sort_newest_first(records: &mut [BenchmarkRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Volatile backend holding records in a vector.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Vec<BenchmarkRecord>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing set of records.
    pub fn with_records(records: Vec<BenchmarkRecord>) -> Self {
        Self { records }
    }
}

impl HistoryBackend for MemoryBackend {
    fn insert(&mut self, record: &BenchmarkRecord) -> Result<()> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(HistoryError::StorageFailure(format!(
                "record {} already exists",
                record.id
            )));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<BenchmarkRecord>> {
        let mut records = self.records.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn delete_by_id(&mut self, id: &Uuid) -> Result<()> {
        self.records.retain(|r| &r.id != id);
        Ok(())
    }

    fn delete_all(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
