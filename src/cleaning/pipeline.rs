//! Cleaning pipeline orchestration

use super::config::CleaningConfig;
use super::prepare::NumericTracker;
use super::report::CleaningReport;
use super::{encode, missing, outlier, reduce, resample, scale, text};
use crate::error::{CleanError, Result};
use crate::utils::{read_csv_bytes, write_csv_string};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Result of one cleaning run: the transformed dataset serialized as CSV plus
/// the accumulated statistics.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub csv: String,
    pub report: CleaningReport,
}

/// The advanced cleaning pipeline.
///
/// One instance serves one request's dataset: stages run strictly in order on
/// a single working frame, each gated by its configuration flag, all
/// appending to one request-scoped report. Nothing survives a run except the
/// returned outcome and the numeric-column snapshot taken before encoding.
#[derive(Debug, Clone)]
pub struct AdvancedCleaner {
    config: CleaningConfig,
    /// Numeric columns as they existed before encoding renamed or removed
    /// them; captured per run, never shared across runs.
    tracker: Option<NumericTracker>,
}

impl AdvancedCleaner {
    /// Create a pipeline for one request
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            config,
            tracker: None,
        }
    }

    /// The numeric-column snapshot captured by the last run, if any.
    pub fn numeric_tracker(&self) -> Option<&NumericTracker> {
        self.tracker.as_ref()
    }

    /// Run the full pipeline on a delimited-text byte stream.
    pub fn clean(&mut self, bytes: &[u8]) -> Result<CleanOutcome> {
        let df = read_csv_bytes(bytes)?;
        self.clean_frame(df)
    }

    /// Run the full pipeline on an already-parsed frame.
    pub fn clean_frame(&mut self, df: DataFrame) -> Result<CleanOutcome> {
        let mut report = CleaningReport::new();
        report.rows_processed = df.height();

        self.validate_columns(&df)?;

        // Sentinel normalization and numeric coercion always run, so every
        // gated stage sees canonical nulls and typed numeric columns.
        let mut frame = missing::normalize_sentinels(&df)?;
        frame = missing::coerce_numeric(&frame, &self.config.numeric_columns)?;
        self.tracker = Some(NumericTracker::capture(&frame));

        if self.config.impute_missing {
            frame = missing::impute(&frame, &self.config, &mut report)?;
        }
        if self.config.remove_outliers {
            frame = outlier::remove_outliers(&frame, &self.config, &mut report)?;
        }
        if self.config.feature_scaling {
            frame = scale::scale_features(&frame, &self.config, &mut report)?;
        }
        if self.config.encode_categorical {
            frame = encode::encode_categorical(&frame, &self.config, &mut report)?;
        }
        if self.config.text_processing {
            frame = text::process_text(&frame, &self.config, &mut report)?;
        }
        if self.config.dimensionality_reduction {
            frame = reduce::reduce_dimensions(&frame, &self.config, &mut report)?;
        }
        if self.config.handle_imbalance {
            frame = resample::handle_imbalance(&frame, &self.config, &mut report)?;
        }

        frame = Self::deduplicate(&frame, &mut report)?;

        info!(
            rows_in = report.rows_processed,
            rows_out = frame.height(),
            outliers = report.outliers_removed,
            duplicates = report.duplicates_removed,
            "cleaning run finished"
        );

        let csv = write_csv_string(&mut frame)?;
        Ok(CleanOutcome { csv, report })
    }

    /// Verify every declared column exists in the dataset; the failure lists
    /// all missing names at once, not just the first.
    fn validate_columns(&self, df: &DataFrame) -> Result<()> {
        let mut known: HashSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        // available_columns, when supplied, narrows the valid set further.
        if !self.config.available_columns.is_empty() {
            let available: HashSet<String> =
                self.config.available_columns.iter().cloned().collect();
            known = known.intersection(&available).cloned().collect();
        }

        let missing: BTreeSet<String> = self
            .config
            .declared_columns()
            .into_iter()
            .filter(|c| !known.contains(c))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CleanError::Config(format!(
                "columns not found in dataset: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            )))
        }
    }

    /// Remove exact full-row duplicates, keeping first occurrences.
    fn deduplicate(df: &DataFrame, report: &mut CleaningReport) -> Result<DataFrame> {
        let n_rows = df.height();

        // Row keys built from exact value representations per column
        let mut column_keys: Vec<Vec<String>> = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let keys: Vec<String> = if let Ok(ca) = series.f64() {
                ca.into_iter()
                    .map(|v| match v {
                        Some(x) => x.to_bits().to_string(),
                        None => "\u{0}".to_string(),
                    })
                    .collect()
            } else if let Ok(ca) = series.str() {
                ca.into_iter()
                    .map(|v| v.unwrap_or("\u{0}").to_string())
                    .collect()
            } else {
                (0..n_rows)
                    .map(|i| {
                        series
                            .get(i)
                            .map(|v| format!("{v:?}"))
                            .unwrap_or_else(|_| "\u{0}".to_string())
                    })
                    .collect()
            };
            column_keys.push(keys);
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(n_rows);
        let mut keep: Vec<u32> = Vec::with_capacity(n_rows);
        for i in 0..n_rows {
            let key = column_keys
                .iter()
                .map(|col| col[i].as_str())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            if seen.insert(key) {
                keep.push(i as u32);
            }
        }

        report.duplicates_removed += n_rows - keep.len();
        if keep.len() == n_rows {
            return Ok(df.clone());
        }

        let idx = IdxCa::from_vec("idx".into(), keep);
        Ok(df.take(&idx)?)
    }
}
