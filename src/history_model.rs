//! Data model definitions for benchmark history.
//!
//! This module defines the record stored for every completed benchmark run
//! ([`BenchmarkRecord`]), the caller-supplied scores that produce one
//! ([`BenchmarkResult`]), and the injected device identity collaborator
//! ([`DeviceIdentityResolver`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HistoryError, Result};

/// One completed benchmark run.
///
/// A record is created exactly once by the history store and is immutable
/// afterwards. There is no update-in-place: correcting a record means deleting
/// it and saving a new one.
///
/// # Structure
///
/// - **id**: random v4 UUID assigned at creation, never reused
/// - **date**: creation timestamp assigned by the store, the natural sort key
/// - **device_model / device_name**: resolved once, when the record is created
/// - **scores**: non-negative integers; `total_score` is stored as the caller gave it
/// - **grade / test_type**: free text, the display layer owns their meaning
/// - **test_duration**: elapsed seconds
/// - **details**: optional free-text payload
///
/// # Serialization
///
/// The stored form uses camelCase keys and keeps every field, `details`
/// included. The export document is a narrower projection, see
/// [`crate::history_document`].
///
/// ```rust
/// use benchmark_history_core::history_model::{BenchmarkRecord, BenchmarkResult, DeviceIdentity};
///
/// let result = BenchmarkResult::new(1200, 900, 700, 650, 3450, "A", "full", 42.5);
/// let record = BenchmarkRecord::from_result(result, DeviceIdentity::new("iPhone15,2", "Test Phone"))?;
///
/// let json = serde_json::to_value(&record)?;
/// assert_eq!(json["cpuScore"], 1200);
/// assert_eq!(json["deviceName"], "Test Phone");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    /// Unique identifier, also the storage key.
    pub id: Uuid,
    /// Creation time in UTC.
    pub date: DateTime<Utc>,
    pub device_model: String,
    pub device_name: String,
    pub cpu_score: u64,
    pub gpu_score: u64,
    pub memory_score: u64,
    pub storage_score: u64,
    /// Caller-computed total. Not checked against the sub-scores.
    pub total_score: u64,
    pub grade: String,
    pub test_type: String,
    /// Elapsed seconds, never negative.
    pub test_duration: f64,
    #[serde(default)]
    pub details: Option<String>,
}

impl BenchmarkRecord {
    /// Builds a new record from a finished run, assigning a fresh id and the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Validation`] if `test_duration` is negative or not
    /// a finite number.
    pub fn from_result(result: BenchmarkResult, identity: DeviceIdentity) -> Result<Self> {
        result.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            device_model: identity.model,
            device_name: identity.name,
            cpu_score: result.cpu_score,
            gpu_score: result.gpu_score,
            memory_score: result.memory_score,
            storage_score: result.storage_score,
            total_score: result.total_score,
            grade: result.grade,
            test_type: result.test_type,
            test_duration: result.test_duration,
            details: result.details,
        })
    }
}

/// Scores and metadata of a finished benchmark run, as handed to
/// [`crate::HistoryStore::save_result`].
///
/// Deserializes from camelCase JSON, which is what the FFI `save_result`
/// entry point accepts:
///
/// ```json
/// {
///   "cpuScore": 1200, "gpuScore": 900, "memoryScore": 700, "storageScore": 650,
///   "totalScore": 3450, "grade": "A", "testType": "full", "testDuration": 42.5,
///   "details": "optional"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub cpu_score: u64,
    pub gpu_score: u64,
    pub memory_score: u64,
    pub storage_score: u64,
    pub total_score: u64,
    pub grade: String,
    pub test_type: String,
    pub test_duration: f64,
    #[serde(default)]
    pub details: Option<String>,
}

impl BenchmarkResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cpu_score: u64,
        gpu_score: u64,
        memory_score: u64,
        storage_score: u64,
        total_score: u64,
        grade: impl Into<String>,
        test_type: impl Into<String>,
        test_duration: f64,
    ) -> Self {
        Self {
            cpu_score,
            gpu_score,
            memory_score,
            storage_score,
            total_score,
            grade: grade.into(),
            test_type: test_type.into(),
            test_duration,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn validate(&self) -> Result<()> {
        validate_test_duration(self.test_duration)
    }
}

/// Elapsed seconds must be finite and non-negative, whether saved or imported.
pub(crate) fn validate_test_duration(seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(HistoryError::Validation(format!(
            "testDuration must be a non-negative number of seconds, got {}",
            seconds
        )));
    }
    Ok(())
}

/// Device model and user-visible device name, resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub model: String,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
        }
    }
}

/// Supplies the device identity stamped on each new record.
///
/// Called once per save. Device introspection lives outside this crate, so
/// implementations only hand back strings that were already resolved. Any
/// `Fn() -> DeviceIdentity` closure is a resolver.
pub trait DeviceIdentityResolver: Send + Sync {
    fn resolve(&self) -> DeviceIdentity;
}

impl<F> DeviceIdentityResolver for F
where
    F: Fn() -> DeviceIdentity + Send + Sync,
{
    fn resolve(&self) -> DeviceIdentity {
        self()
    }
}

/// Resolver returning a fixed identity handed over by the host at startup.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub DeviceIdentity);

impl DeviceIdentityResolver for StaticIdentity {
    fn resolve(&self) -> DeviceIdentity {
        self.0.clone()
    }
}
