//! Portable JSON document for exporting and importing the whole history.
//!
//! The document is a JSON array with one object per record:
//!
//! ```json
//! [
//!   {
//!     "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
//!     "date": "2026-10-18T09:30:00Z",
//!     "deviceModel": "iPhone15,2",
//!     "deviceName": "Test Phone",
//!     "cpuScore": 1200,
//!     "gpuScore": 900,
//!     "memoryScore": 700,
//!     "storageScore": 650,
//!     "totalScore": 3450,
//!     "grade": "A",
//!     "testType": "full",
//!     "testDuration": 42.5
//!   }
//! ]
//! ```
//!
//! Dates are RFC 3339 in UTC, truncated to whole seconds. `details` is not part
//! of the document, so it does not survive an export/import round trip.

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{HistoryError, Result};
use crate::history_model::{validate_test_duration, BenchmarkRecord};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentEntry {
    id: Uuid,
    #[serde(serialize_with = "serialize_date", deserialize_with = "deserialize_date")]
    date: DateTime<Utc>,
    device_model: String,
    device_name: String,
    cpu_score: u64,
    gpu_score: u64,
    memory_score: u64,
    storage_score: u64,
    total_score: u64,
    grade: String,
    test_type: String,
    test_duration: f64,
}

impl From<&BenchmarkRecord> for DocumentEntry {
    fn from(record: &BenchmarkRecord) -> Self {
        Self {
            id: record.id,
            date: record.date,
            device_model: record.device_model.clone(),
            device_name: record.device_name.clone(),
            cpu_score: record.cpu_score,
            gpu_score: record.gpu_score,
            memory_score: record.memory_score,
            storage_score: record.storage_score,
            total_score: record.total_score,
            grade: record.grade.clone(),
            test_type: record.test_type.clone(),
            test_duration: record.test_duration,
        }
    }
}

impl From<DocumentEntry> for BenchmarkRecord {
    fn from(entry: DocumentEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            device_model: entry.device_model,
            device_name: entry.device_name,
            cpu_score: entry.cpu_score,
            gpu_score: entry.gpu_score,
            memory_score: entry.memory_score,
            storage_score: entry.storage_score,
            total_score: entry.total_score,
            grade: entry.grade,
            test_type: entry.test_type,
            test_duration: entry.test_duration,
            details: None,
        }
    }
}

fn serialize_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// Result of decoding an import document.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    /// Well-formed entries, in document order.
    pub records: Vec<BenchmarkRecord>,
    /// Entries that were dropped because a field was missing or mistyped.
    pub skipped: usize,
}

/// Encodes `records` as a pretty-printed export document, preserving order.
pub fn export_document(records: &[BenchmarkRecord]) -> Result<String> {
    let entries: Vec<DocumentEntry> = records.iter().map(DocumentEntry::from).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Decodes an import document.
///
/// Each entry is decoded on its own: a bad entry is skipped and counted, it
/// never aborts the rest of the list. Entries are held to the same rules as a
/// save, so a negative or non-finite `testDuration` is skipped too.
///
/// # Errors
///
/// Returns [`HistoryError::MalformedDocument`] if `document` is not a JSON array.
pub fn parse_document(document: &str) -> Result<ParsedDocument> {
    let entries: Vec<JsonValue> = serde_json::from_str(document)
        .map_err(|e| HistoryError::MalformedDocument(format!("expected a JSON list of records: {e}")))?;

    let mut parsed = ParsedDocument::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match decode_entry(entry) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!("Skipping import entry {index}: {e}");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn decode_entry(entry: JsonValue) -> Result<BenchmarkRecord> {
    let entry: DocumentEntry = serde_json::from_value(entry)?;
    validate_test_duration(entry.test_duration)?;
    Ok(entry.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_record() -> BenchmarkRecord {
        BenchmarkRecord {
            id: Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap(),
            date: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
                + chrono::Duration::milliseconds(750),
            device_model: "iPhone15,2".to_string(),
            device_name: "Test Phone".to_string(),
            cpu_score: 1200,
            gpu_score: 900,
            memory_score: 700,
            storage_score: 650,
            total_score: 3450,
            grade: "A".to_string(),
            test_type: "full".to_string(),
            test_duration: 42.5,
            details: Some("not exported".to_string()),
        }
    }

    fn sample_entry() -> JsonValue {
        json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "date": "2026-10-18T09:30:00Z",
            "deviceModel": "iPhone15,2",
            "deviceName": "Test Phone",
            "cpuScore": 1200,
            "gpuScore": 900,
            "memoryScore": 700,
            "storageScore": 650,
            "totalScore": 3450,
            "grade": "A",
            "testType": "full",
            "testDuration": 42.5
        })
    }

    #[test]
    fn export_uses_document_keys_and_drops_details() {
        let doc = export_document(&[sample_record()]).unwrap();
        let value: JsonValue = serde_json::from_str(&doc).unwrap();
        let entry = &value.as_array().unwrap()[0];

        let mut keys: Vec<&str> = entry.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "cpuScore", "date", "deviceModel", "deviceName", "gpuScore", "grade", "id",
                "memoryScore", "storageScore", "testDuration", "testType", "totalScore",
            ]
        );
        assert_eq!(entry["date"], "2026-10-18T09:30:00Z");
        assert_eq!(entry["id"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn export_of_empty_history_is_empty_list() {
        let doc = export_document(&[]).unwrap();
        let value: JsonValue = serde_json::from_str(&doc).unwrap();
        assert_eq!(value, json!([]));
    }

    #[test]
    fn parse_accepts_explicit_offsets() {
        let mut entry = sample_entry();
        entry["date"] = json!("2026-10-18T11:30:00+02:00");

        let parsed = parse_document(&json!([entry]).to_string()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.records[0].date,
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
        );
        assert_eq!(parsed.records[0].details, None);
    }

    #[test]
    fn parse_accepts_integer_duration() {
        let mut entry = sample_entry();
        entry["testDuration"] = json!(30);

        let parsed = parse_document(&json!([entry]).to_string()).unwrap();
        assert_eq!(parsed.records[0].test_duration, 30.0);
    }

    #[test]
    fn parse_skips_mistyped_entries() {
        let mut bad_id = sample_entry();
        bad_id["id"] = json!("not-a-uuid");
        let mut bad_date = sample_entry();
        bad_date["date"] = json!("18/10/2026 09:30");
        let mut fractional_score = sample_entry();
        fractional_score["gpuScore"] = json!(12.5);
        let mut negative_score = sample_entry();
        negative_score["memoryScore"] = json!(-1);
        let mut string_score = sample_entry();
        string_score["totalScore"] = json!("3450");
        let mut missing_grade = sample_entry();
        missing_grade.as_object_mut().unwrap().remove("grade");
        let mut negative_duration = sample_entry();
        negative_duration["testDuration"] = json!(-5.0);

        let doc = json!([
            bad_id,
            bad_date,
            fractional_score,
            negative_score,
            string_score,
            missing_grade,
            negative_duration,
            42,
            sample_entry()
        ]);
        let parsed = parse_document(&doc.to_string()).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 8);
    }

    #[test]
    fn parse_rejects_non_list_documents() {
        for doc in [sample_entry().to_string(), "not json".to_string(), "\"[]\"".to_string()] {
            match parse_document(&doc) {
                Err(HistoryError::MalformedDocument(_)) => {}
                other => panic!("expected MalformedDocument for {doc}, got {other:?}"),
            }
        }
    }
}
