//! Best-of and average-of statistics over a set of records.
//!
//! Aggregates are never stored; they are recomputed from the current cache
//! whenever the display layer asks for them.

use serde::Serialize;

use crate::history_model::BenchmarkRecord;

/// Highest score per category. `None` means there is no history at all,
/// which is different from a best score of zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BestScores {
    pub cpu: Option<u64>,
    pub gpu: Option<u64>,
    pub memory: Option<u64>,
    pub storage: Option<u64>,
}

impl BestScores {
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        Self {
            cpu: records.iter().map(|r| r.cpu_score).max(),
            gpu: records.iter().map(|r| r.gpu_score).max(),
            memory: records.iter().map(|r| r.memory_score).max(),
            storage: records.iter().map(|r| r.storage_score).max(),
        }
    }
}

/// Arithmetic mean per category; all zero for an empty history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AverageScores {
    pub cpu: f64,
    pub gpu: f64,
    pub memory: f64,
    pub storage: f64,
}

impl AverageScores {
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let count = records.len() as f64;
        let mean = |score: fn(&BenchmarkRecord) -> u64| {
            records.iter().map(|r| score(r) as f64).sum::<f64>() / count
        };

        Self {
            cpu: mean(|r| r.cpu_score),
            gpu: mean(|r| r.gpu_score),
            memory: mean(|r| r.memory_score),
            storage: mean(|r| r.storage_score),
        }
    }
}
