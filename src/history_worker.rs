//! Background dispatch for history operations.
//!
//! Saves, deletes, imports and reloads do blocking I/O and must stay off the
//! thread that renders the history. [`HistoryWorker`] runs them on a dedicated
//! thread in submission order. Each call returns a [`Completion`] the caller may
//! wait on or drop; the resulting cache is delivered to subscribers of the
//! underlying store either way. Jobs cannot be cancelled.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use uuid::Uuid;

use crate::error::{HistoryError, Result};
use crate::history_backend::HistoryBackend;
use crate::history_model::{BenchmarkRecord, BenchmarkResult};
use crate::history_store::{HistoryStore, ImportReport};

const WORKER_THREAD_NAME: &str = "benchmark-history";

type Job<B> = Box<dyn FnOnce(&HistoryStore<B>) + Send>;

/// Pending result of a job submitted to a [`HistoryWorker`].
#[must_use = "dropping a Completion does not cancel the job, but its result is lost"]
pub struct Completion<T> {
    receiver: Receiver<T>,
}

impl<T> Completion<T> {
    /// Blocks until the job has run.
    pub fn wait(self) -> std::result::Result<T, HistoryError> {
        self.receiver.recv().map_err(|_| HistoryError::WorkerStopped)
    }

    /// Returns the result if the job has already run.
    pub fn try_take(&self) -> std::result::Result<Option<T>, HistoryError> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HistoryError::WorkerStopped),
        }
    }
}

pub struct HistoryWorker<B: HistoryBackend + 'static> {
    store: Arc<HistoryStore<B>>,
    jobs: Option<Sender<Job<B>>>,
    handle: Option<JoinHandle<()>>,
}

impl<B: HistoryBackend + 'static> HistoryWorker<B> {
    /// Starts the worker thread for `store`.
    pub fn spawn(store: Arc<HistoryStore<B>>) -> Result<Self> {
        let (jobs, queue) = mpsc::channel::<Job<B>>();
        let worker_store = Arc::clone(&store);

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                for job in queue {
                    job(worker_store.as_ref());
                }
                debug!("History worker queue closed");
            })
            .map_err(spawn_error)?;

        Ok(Self {
            store,
            jobs: Some(jobs),
            handle: Some(handle),
        })
    }

    /// The store the worker drives, for reads and subscriptions.
    pub fn store(&self) -> &Arc<HistoryStore<B>> {
        &self.store
    }

    pub fn save_result(&self, result: BenchmarkResult) -> Completion<Result<BenchmarkRecord>> {
        self.submit(move |store| store.save_result(result))
    }

    pub fn reload(&self) -> Completion<Result<()>> {
        self.submit(|store| store.reload())
    }

    pub fn delete_result(&self, id: Uuid) -> Completion<Result<()>> {
        self.submit(move |store| store.delete_result(&id))
    }

    pub fn clear_history(&self) -> Completion<Result<()>> {
        self.submit(|store| store.clear_history())
    }

    pub fn import_from_document(&self, document: String) -> Completion<Result<ImportReport>> {
        self.submit(move |store| store.import_from_document(&document))
    }

    fn submit<T, F>(&self, operation: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(&HistoryStore<B>) -> T + Send + 'static,
    {
        let (reply, receiver) = mpsc::channel();
        let job: Job<B> = Box::new(move |store: &HistoryStore<B>| {
            // The caller may have dropped its Completion.
            let _ = reply.send(operation(store));
        });

        match &self.jobs {
            Some(jobs) => {
                if jobs.send(job).is_err() {
                    warn!("History worker is gone; job dropped");
                }
            }
            None => warn!("History worker is shutting down; job dropped"),
        }

        Completion { receiver }
    }
}

pub(crate) fn spawn_error(err: io::Error) -> HistoryError {
    warn!("Failed to start history worker: {err}");
    HistoryError::WorkerSpawn(err.to_string())
}

impl<B: HistoryBackend + 'static> Drop for HistoryWorker<B> {
    fn drop(&mut self) {
        // Closing the queue lets the thread finish the remaining jobs and exit.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("History worker thread panicked");
            }
        }
    }
}
