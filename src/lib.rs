//! # Benchmark History Core
//!
//! Durable history of benchmark runs for a mobile device-information app,
//! designed for FFI (Foreign Function Interface) integration with the app's UI
//! layer. Records are stored in LMDB (Lightning Memory-Mapped Database); the
//! UI reads an in-memory cache that is always reloaded from the database after
//! every write.
//!
//! ## Features
//!
//! - **Single write path**: [`HistoryStore`] serializes every mutation and its reload
//! - **Aggregates**: best-ever and average score per category, computed on demand
//! - **Portable documents**: lossless JSON export/import of the whole history
//! - **Observable cache**: subscribers receive every new snapshot
//! - **Background dispatch**: [`HistoryWorker`] keeps blocking I/O off the UI thread
//!
//! ## Quick Start
//!
//! ```no_run
//! use benchmark_history_core::{
//!     BenchmarkResult, DeviceIdentity, HistoryConfig, HistoryStore, LmdbBackend, StaticIdentity,
//! };
//!
//! let backend = LmdbBackend::open(&HistoryConfig::new("benchmark_history"))?;
//! let store = HistoryStore::new(
//!     backend,
//!     StaticIdentity(DeviceIdentity::new("iPhone15,2", "My Phone")),
//! );
//!
//! store.save_result(BenchmarkResult::new(1200, 900, 700, 650, 3450, "A", "full", 42.5))?;
//! assert_eq!(store.best_scores().cpu, Some(1200));
//! # Ok::<(), benchmark_history_core::HistoryError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON-encoded [`AppResponse`](app_response::AppResponse)
//! that must be released with [`free_response`]:
//!
//! - [`create_history`] - Open the history database
//! - [`save_result`] - Record a finished benchmark run
//! - [`get_history`] - All records, newest first
//! - [`reload_history`] - Reload the cache from disk
//! - [`delete_result`] - Delete one record by id
//! - [`clear_history`] - Delete every record
//! - [`best_scores`] / [`average_scores`] - Aggregates
//! - [`export_history`] / [`import_history`] - Portable JSON documents
//! - [`close_history`] - Close the database and free the handle

pub mod app_response;
pub mod config;
pub mod error;
pub mod history_backend;
pub mod history_document;
pub mod history_model;
pub mod history_store;
pub mod history_worker;
pub mod lmdb_backend;
pub mod score_summary;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

pub use crate::config::{Durability, HistoryConfig};
pub use crate::error::HistoryError;
pub use crate::history_backend::{HistoryBackend, MemoryBackend};
pub use crate::history_model::{
    BenchmarkRecord, BenchmarkResult, DeviceIdentity, DeviceIdentityResolver, StaticIdentity,
};
pub use crate::history_store::{HistorySnapshot, HistoryStore, ImportReport};
pub use crate::history_worker::{Completion, HistoryWorker};
pub use crate::lmdb_backend::LmdbBackend;
pub use crate::score_summary::{AverageScores, BestScores};

use crate::app_response::AppResponse;

/// Store type handed across the FFI boundary.
pub type HistoryHandle = HistoryStore<LmdbBackend>;

/// Opens the benchmark history described by a JSON configuration.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`HistoryConfig`], e.g. `{"path":"history"}`
/// * `device_model` - Device model identifier stamped on new records
/// * `device_name` - User-visible device name stamped on new records
///
/// # Returns
///
/// A pointer to the [`HistoryHandle`], or a null pointer on failure. Release it
/// with [`close_history`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use benchmark_history_core::create_history;
///
/// let config = CString::new(r#"{"path":"benchmark_history"}"#).unwrap();
/// let model = CString::new("iPhone15,2").unwrap();
/// let name = CString::new("My Phone").unwrap();
/// let handle = create_history(config.as_ptr(), model.as_ptr(), name.as_ptr());
/// assert!(!handle.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_history(
    config_json: *const c_char,
    device_model: *const c_char,
    device_name: *const c_char,
) -> *mut HistoryHandle {
    let (config_str, model, name) = match (
        c_ptr_to_str(config_json),
        c_ptr_to_str(device_model),
        c_ptr_to_str(device_name),
    ) {
        (Some(config), Some(model), Some(name)) => (config, model, name),
        _ => {
            warn!("Null or invalid UTF-8 argument passed to create_history");
            return std::ptr::null_mut();
        }
    };

    let config = match HistoryConfig::from_json(config_str) {
        Ok(config) => config,
        Err(e) => {
            warn!("Rejected history configuration: {e}");
            return std::ptr::null_mut();
        }
    };

    match LmdbBackend::open(&config) {
        Ok(backend) => {
            let identity = StaticIdentity(DeviceIdentity::new(model, name));
            info!("History opened for device {model}");
            Box::into_raw(Box::new(HistoryStore::new(backend, identity)))
        }
        Err(e) => {
            warn!("Failed to open history at {:?}: {e}", config.path);
            std::ptr::null_mut()
        }
    }
}

/// Records a finished benchmark run.
///
/// # JSON Format
///
/// ```json
/// {
///   "cpuScore": 1200, "gpuScore": 900, "memoryScore": 700, "storageScore": 650,
///   "totalScore": 3450, "grade": "A", "testType": "full", "testDuration": 42.5,
///   "details": "optional free text"
/// }
/// ```
///
/// On success the `Ok` payload is the stored record as JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_result(handle: *mut HistoryHandle, result_json: *const c_char) -> *const c_char {
    let store = match handle_ref(handle, "save_result") {
        Ok(store) => store,
        Err(response) => return response,
    };
    let json = match c_ptr_to_string(result_json, "result JSON") {
        Ok(json) => json,
        Err(response) => return response,
    };

    let result: BenchmarkResult = match serde_json::from_str(&json) {
        Ok(result) => result,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid benchmark result JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match store.save_result(result) {
        Ok(record) => json_response(&record),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Returns every cached record, newest first, as a JSON array.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_history(handle: *mut HistoryHandle) -> *const c_char {
    match handle_ref(handle, "get_history") {
        Ok(store) => json_response(store.records().as_slice()),
        Err(response) => response,
    }
}

/// Reloads the cache from disk and returns the reloaded records.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reload_history(handle: *mut HistoryHandle) -> *const c_char {
    let store = match handle_ref(handle, "reload_history") {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.reload() {
        Ok(()) => json_response(store.records().as_slice()),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes one record. An unknown id still succeeds.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_result(handle: *mut HistoryHandle, id: *const c_char) -> *const c_char {
    let store = match handle_ref(handle, "delete_result") {
        Ok(store) => store,
        Err(response) => return response,
    };
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let id = match Uuid::parse_str(&id_str) {
        Ok(id) => id,
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid record id '{id_str}': {e}"));
            return response_to_c_string(&error);
        }
    };

    match store.delete_result(&id) {
        Ok(()) => response_to_c_string(&AppResponse::success(format!("Record {id} deleted"))),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Deletes every record.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_history(handle: *mut HistoryHandle) -> *const c_char {
    let store = match handle_ref(handle, "clear_history") {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.clear_history() {
        Ok(()) => response_to_c_string(&AppResponse::success("History cleared successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Best score per category; absent categories are `null`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn best_scores(handle: *mut HistoryHandle) -> *const c_char {
    match handle_ref(handle, "best_scores") {
        Ok(store) => json_response(&store.best_scores()),
        Err(response) => response,
    }
}

/// Average score per category.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn average_scores(handle: *mut HistoryHandle) -> *const c_char {
    match handle_ref(handle, "average_scores") {
        Ok(store) => json_response(&store.average_scores()),
        Err(response) => response,
    }
}

/// Exports the history. The `Ok` payload is the export document itself.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_history(handle: *mut HistoryHandle) -> *const c_char {
    let store = match handle_ref(handle, "export_history") {
        Ok(store) => store,
        Err(response) => return response,
    };

    match store.export_to_document() {
        Ok(document) => response_to_c_string(&AppResponse::Ok(document)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Imports an export document.
///
/// # Returns
///
/// * `Ok` - the document was a JSON list (import result `true`). The payload is
///   the [`ImportReport`]; skipped and failed entries are counted there.
/// * `ValidationError` - the document was not a JSON list (import result
///   `false`). Nothing was written.
/// * `DatabaseError` - the document was a JSON list but the final flush
///   failed. Entries inserted before the flush may or may not be durable;
///   call [`get_history`] to see what the store now holds.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_history(handle: *mut HistoryHandle, document: *const c_char) -> *const c_char {
    let store = match handle_ref(handle, "import_history") {
        Ok(store) => store,
        Err(response) => return response,
    };
    let document = match c_ptr_to_string(document, "document") {
        Ok(document) => document,
        Err(response) => return response,
    };

    match store.import_from_document(&document) {
        Ok(report) => json_response(&report),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Closes the database and frees the handle. The handle must not be used
/// afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_history(handle: *mut HistoryHandle) -> *const c_char {
    if handle.is_null() {
        let error = AppResponse::BadRequest("Null handle passed to close_history".to_string());
        return response_to_c_string(&error);
    }

    // LMDB closes the environment when the backend is dropped.
    drop(unsafe { Box::from_raw(handle) });
    info!("History closed");
    response_to_c_string(&AppResponse::success("History closed successfully"))
}

/// Frees a response string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *const c_char) {
    if !response.is_null() {
        drop(unsafe { CString::from_raw(response as *mut c_char) });
    }
}

fn handle_ref<'a>(handle: *mut HistoryHandle, function: &str) -> Result<&'a HistoryHandle, *const c_char> {
    match unsafe { handle.as_ref() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle passed to {function}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Serializes `response` into a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    if !matches!(response, AppResponse::Ok(_)) {
        warn!("FFI call failed: {response}");
    }

    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

fn c_ptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Converts a C string argument, or builds the `BadRequest` response to return.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
