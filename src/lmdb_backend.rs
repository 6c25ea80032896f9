//! LMDB implementation of [`HistoryBackend`].
//!
//! Records live in a single named database inside an LMDB environment
//! directory. Keys are hyphenated UUID strings, values are the JSON form of
//! [`BenchmarkRecord`]. Each mutation runs in its own write transaction, so
//! `insert`, `delete_by_id` and `delete_all` are individually atomic.

use std::path::{Path, PathBuf};

use lmdb::{
    Cursor, Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction, WriteFlags,
};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Durability, HistoryConfig};
use crate::error::{HistoryError, Result};
use crate::history_backend::{sort_newest_first, HistoryBackend};
use crate::history_model::BenchmarkRecord;

const DB_NAME: &str = "benchmark_results";

pub struct LmdbBackend {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbBackend {
    /// Opens (or creates) the environment described by `config`.
    ///
    /// # Errors
    ///
    /// - [`HistoryError::Config`] if the configuration does not validate
    /// - [`HistoryError::StorageFailure`] if the directory cannot be created or
    ///   LMDB refuses to open it
    pub fn open(config: &HistoryConfig) -> Result<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.path)?;

        let mut flags = EnvironmentFlags::empty();
        if config.durability == Durability::Deferred {
            flags |= EnvironmentFlags::NO_SYNC;
        }

        let env = Environment::new()
            .set_flags(flags)
            .set_max_dbs(1)
            .set_map_size(config.map_size)
            .set_max_readers(config.max_readers)
            .open(&config.path)
            .map_err(|e| {
                warn!("Failed to open LMDB environment at {:?}: {e}", config.path);
                HistoryError::from(e)
            })?;

        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!(
            "Benchmark history opened at {:?} ({:?} durability)",
            config.path, config.durability
        );

        Ok(Self {
            env,
            db,
            path: config.path.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryBackend for LmdbBackend {
    fn insert(&mut self, record: &BenchmarkRecord) -> Result<()> {
        let key = record.id.to_string();
        let value = serde_json::to_vec(record)?;

        let mut txn = self.env.begin_rw_txn()?;
        match txn.put(self.db, &key, &value, WriteFlags::NO_OVERWRITE) {
            Ok(()) => {}
            Err(lmdb::Error::KeyExist) => {
                return Err(HistoryError::StorageFailure(format!(
                    "record {key} already exists"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;

        debug!("Inserted benchmark record {key}");
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<BenchmarkRecord>> {
        let txn = self.env.begin_ro_txn()?;
        let mut records = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(self.db)?;
            for (key, value) in cursor.iter() {
                let record: BenchmarkRecord = serde_json::from_slice(value).map_err(|e| {
                    HistoryError::StorageFailure(format!(
                        "corrupted record under key {}: {e}",
                        String::from_utf8_lossy(key)
                    ))
                })?;
                records.push(record);
            }
        }
        txn.abort();

        sort_newest_first(&mut records);
        debug!("Fetched {} benchmark records", records.len());
        Ok(records)
    }

    fn delete_by_id(&mut self, id: &Uuid) -> Result<()> {
        let key = id.to_string();

        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                debug!("Deleted benchmark record {key}");
                Ok(())
            }
            // Dropping the transaction aborts it.
            Err(lmdb::Error::NotFound) => {
                debug!("No benchmark record {key} to delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_all(&mut self) -> Result<()> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        info!("Cleared all benchmark records");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.env.sync(true)?;
        Ok(())
    }
}
