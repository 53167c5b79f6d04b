//! Statistics accumulated across one cleaning run

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stage that degraded to a simpler method instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageFallback {
    /// Stage that degraded, e.g. "imputation" or "imbalance"
    pub stage: String,
    /// Human-readable reason the preferred method could not run
    pub reason: String,
}

/// Append-only record of what the pipeline changed.
///
/// Created empty at pipeline start, appended to by each stage, returned
/// verbatim to the caller. Never shared across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Rows in the dataset as ingested
    pub rows_processed: usize,
    /// Rows dropped by any filtering stage
    pub rows_removed: usize,
    /// Columns touched by stages, cumulative
    pub columns_processed: usize,
    /// Per-column count of filled missing values, cumulative
    pub missing_values_imputed: HashMap<String, usize>,
    /// Columns rescaled by the scaler
    pub columns_normalized: Vec<String>,
    /// Generated indicator / feature column names
    pub columns_encoded: Vec<String>,
    /// Exact-duplicate rows dropped by the final pass
    pub duplicates_removed: usize,
    /// Rows dropped by the outlier filter
    pub outliers_removed: usize,
    /// Stages that fell back to a simpler method, with reasons
    pub fallbacks: Vec<StageFallback>,
}

impl CleaningReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a column's imputed-value counter (cumulative across stages).
    pub fn record_imputed(&mut self, column: &str, count: usize) {
        if count > 0 {
            *self
                .missing_values_imputed
                .entry(column.to_string())
                .or_insert(0) += count;
        }
    }

    /// Record a stage degradation.
    pub fn record_fallback(&mut self, stage: &str, reason: impl Into<String>) {
        self.fallbacks.push(StageFallback {
            stage: stage.to_string(),
            reason: reason.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputed_counts_accumulate() {
        let mut report = CleaningReport::new();
        report.record_imputed("age", 3);
        report.record_imputed("age", 2);
        assert_eq!(report.missing_values_imputed["age"], 5);
    }

    #[test]
    fn test_zero_count_not_recorded() {
        let mut report = CleaningReport::new();
        report.record_imputed("age", 0);
        assert!(!report.missing_values_imputed.contains_key("age"));
    }

    #[test]
    fn test_report_serializes_as_nested_mapping() {
        let mut report = CleaningReport::new();
        report.rows_processed = 10;
        report.record_imputed("score", 4);
        report.record_fallback("imputation", "not enough complete rows for knn");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows_processed"], 10);
        assert_eq!(json["missing_values_imputed"]["score"], 4);
        assert_eq!(json["fallbacks"][0]["stage"], "imputation");
    }
}
