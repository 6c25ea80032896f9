//! Error types for the benchmark history core.
//!
//! Every fallible operation in the crate returns [`HistoryError`]. None of these
//! errors is fatal: at worst the history is stale or incomplete until the caller
//! retries the operation or calls `reload`.

use thiserror::Error;

/// Main error type of the history store and its backends.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The backend could not complete an insert, delete, fetch or flush durably.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// An import payload was not a JSON list of records.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Caller-supplied values were rejected before reaching the backend.
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid store configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background worker thread is no longer running.
    #[error("History worker stopped before completing the operation")]
    WorkerStopped,

    /// The background worker thread could not be started.
    #[error("History worker could not start: {0}")]
    WorkerSpawn(String),
}

impl From<lmdb::Error> for HistoryError {
    fn from(err: lmdb::Error) -> Self {
        HistoryError::StorageFailure(format!("LMDB error: {err}"))
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::StorageFailure(format!("IO error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
