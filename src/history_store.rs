//! The benchmark history store.
//!
//! [`HistoryStore`] is the only write path to the backend. It keeps an
//! in-memory cache that is always a verbatim copy of what the backend returned
//! from its last `fetch_all`, newest first, and broadcasts every new cache
//! snapshot to subscribers.
//!
//! Mutations hold the backend lock for the whole "mutate, then reload" unit,
//! so a reload never observes another call's half-applied write. The cache is
//! replaced wholesale, never patched.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{HistoryError, Result};
use crate::history_backend::{sort_newest_first, HistoryBackend};
use crate::history_document::{export_document, parse_document};
use crate::history_model::{BenchmarkRecord, BenchmarkResult, DeviceIdentityResolver};
use crate::score_summary::{AverageScores, BestScores};

/// An immutable view of the cache at one point in time.
pub type HistorySnapshot = Arc<Vec<BenchmarkRecord>>;

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries written to the backend.
    pub imported: usize,
    /// Entries dropped because a field was missing or mistyped.
    pub skipped: usize,
    /// Well-formed entries the backend refused, such as duplicate ids.
    pub failed: usize,
}

pub struct HistoryStore<B: HistoryBackend> {
    backend: Mutex<B>,
    cache: RwLock<HistorySnapshot>,
    observers: Mutex<Vec<Sender<HistorySnapshot>>>,
    resolver: Box<dyn DeviceIdentityResolver>,
}

impl<B: HistoryBackend> HistoryStore<B> {
    /// Creates a store owning `backend` and loads the cache from it.
    ///
    /// A failed initial load is logged and leaves the cache empty; call
    /// [`HistoryStore::reload`] to retry.
    pub fn new(backend: B, resolver: impl DeviceIdentityResolver + 'static) -> Self {
        let store = Self {
            backend: Mutex::new(backend),
            cache: RwLock::new(Arc::new(Vec::new())),
            observers: Mutex::new(Vec::new()),
            resolver: Box::new(resolver),
        };

        if let Err(e) = store.reload() {
            warn!("Initial history load failed: {e}");
        }

        store
    }

    /// Records a finished benchmark run and returns the stored record.
    ///
    /// The cache is reloaded from the backend whether or not the write
    /// succeeded. If the flush fails, the new record is removed again so the
    /// cache never shows a record whose durability is unconfirmed.
    pub fn save_result(&self, result: BenchmarkResult) -> Result<BenchmarkRecord> {
        let identity = self.resolver.resolve();
        let record = BenchmarkRecord::from_result(result, identity)?;

        let mut backend = self.backend.lock();
        let outcome = backend.insert(&record).and_then(|()| {
            backend.flush().map_err(|e| {
                warn!("Flush failed after saving {}; rolling back: {e}", record.id);
                if let Err(rollback) = backend.delete_by_id(&record.id) {
                    warn!("Rollback of {} failed: {rollback}", record.id);
                }
                e
            })
        });

        self.finish_mutation(&backend, "save", outcome)?;
        info!(
            "Saved benchmark {} ({}, total {})",
            record.id, record.test_type, record.total_score
        );
        Ok(record)
    }

    /// Replaces the cache with the backend's current contents.
    ///
    /// On failure the previous cache is kept.
    pub fn reload(&self) -> Result<()> {
        let backend = self.backend.lock();
        self.reload_locked(&backend)
    }

    /// Deletes one record. Deleting an unknown id is a no-op.
    pub fn delete_result(&self, id: &Uuid) -> Result<()> {
        let mut backend = self.backend.lock();
        let outcome = backend.delete_by_id(id).and_then(|()| backend.flush());
        self.finish_mutation(&backend, "delete", outcome)
    }

    /// Deletes every record.
    pub fn clear_history(&self) -> Result<()> {
        let mut backend = self.backend.lock();
        let outcome = backend.delete_all().and_then(|()| backend.flush());
        self.finish_mutation(&backend, "clear", outcome)?;
        info!("Benchmark history cleared");
        Ok(())
    }

    pub fn best_scores(&self) -> BestScores {
        BestScores::from_records(&self.records())
    }

    pub fn average_scores(&self) -> AverageScores {
        AverageScores::from_records(&self.records())
    }

    /// Serializes the cached history as a portable JSON document.
    pub fn export_to_document(&self) -> Result<String> {
        export_document(&self.records())
    }

    /// Imports every well-formed entry of `document`.
    ///
    /// Bad entries are skipped and entries the backend refuses are counted as
    /// failed; neither aborts the import. After the whole list one flush and one
    /// reload run.
    ///
    /// # Errors
    ///
    /// - [`HistoryError::MalformedDocument`] if the document is not a JSON list;
    ///   nothing is written and the cache is untouched
    /// - [`HistoryError::StorageFailure`] if the final flush fails; entries
    ///   already inserted are not rolled back and the cache shows what the
    ///   backend holds after the reload
    pub fn import_from_document(&self, document: &str) -> Result<ImportReport> {
        let parsed = parse_document(document)?;
        let mut report = ImportReport {
            skipped: parsed.skipped,
            ..ImportReport::default()
        };

        let mut backend = self.backend.lock();
        for record in &parsed.records {
            match backend.insert(record) {
                Ok(()) => report.imported += 1,
                Err(e) => {
                    warn!("Import of record {} failed: {e}", record.id);
                    report.failed += 1;
                }
            }
        }
        let outcome = backend.flush();
        self.finish_mutation(&backend, "import", outcome)?;

        info!(
            "Imported {} benchmark records ({} skipped, {} failed)",
            report.imported, report.skipped, report.failed
        );
        Ok(report)
    }

    /// The current cache, newest first.
    pub fn records(&self) -> HistorySnapshot {
        Arc::clone(&self.cache.read())
    }

    pub fn record(&self, id: &Uuid) -> Option<BenchmarkRecord> {
        self.cache.read().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Subscribes to cache updates.
    ///
    /// The receiver gets the current snapshot right away and then one snapshot
    /// after every completed reload. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<HistorySnapshot> {
        let (sender, receiver) = mpsc::channel();
        let mut observers = self.observers.lock();
        // Sent under the observer lock so no newer snapshot can overtake it.
        let _ = sender.send(self.records());
        observers.push(sender);
        receiver
    }

    /// Reloads after a mutation and reports the mutation's own error first.
    fn finish_mutation(
        &self,
        backend: &MutexGuard<'_, B>,
        operation: &str,
        outcome: Result<()>,
    ) -> Result<()> {
        if let Err(e) = &outcome {
            warn!("History {operation} failed: {e}");
        }
        let reloaded = self.reload_locked(backend);
        outcome.and(reloaded)
    }

    fn reload_locked(&self, backend: &MutexGuard<'_, B>) -> Result<()> {
        let mut records = backend.fetch_all().map_err(|e| {
            warn!("History reload failed, keeping previous cache: {e}");
            e
        })?;
        sort_newest_first(&mut records);

        let snapshot: HistorySnapshot = Arc::new(records);
        *self.cache.write() = Arc::clone(&snapshot);
        debug!("History cache reloaded with {} records", snapshot.len());

        self.publish(snapshot);
        Ok(())
    }

    fn publish(&self, snapshot: HistorySnapshot) {
        let mut observers = self.observers.lock();
        observers.retain(|observer| observer.send(Arc::clone(&snapshot)).is_ok());
    }
}
