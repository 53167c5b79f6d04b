//! Outlier row filtering

use super::config::{CleaningConfig, OutlierMethod};
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use polars::prelude::*;
use tracing::debug;

/// Drop rows outside a statistical bound, per declared numeric column.
///
/// Columns are processed sequentially against the already-filtered frame, so
/// a row failing the bound on any column is removed. A row whose value is
/// missing in the column under test fails the bound.
pub fn remove_outliers(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let columns: Vec<String> = config
        .numeric_columns
        .iter()
        .filter(|c| df.column(c.as_str()).is_ok())
        .cloned()
        .collect();

    if columns.is_empty() {
        return Ok(df.clone());
    }

    let initial_rows = df.height();
    let mut result = df.clone();

    for name in &columns {
        result = match config.outlier_method {
            OutlierMethod::Iqr => filter_iqr(&result, name, config.outlier_threshold)?,
            OutlierMethod::Zscore => filter_zscore(&result, name, config.outlier_threshold)?,
        };
    }

    let removed = initial_rows - result.height();
    report.rows_removed += removed;
    report.outliers_removed += removed;
    report.columns_processed += columns.len();
    debug!(removed, columns = columns.len(), "outlier filtering done");

    Ok(result)
}

/// Keep rows inside [Q1 - k*IQR, Q3 + k*IQR].
fn filter_iqr(df: &DataFrame, column: &str, multiplier: f64) -> Result<DataFrame> {
    let ca = numeric_column(df, column)?;

    let q1 = ca
        .quantile(0.25, QuantileMethod::Linear)
        .unwrap_or(Some(0.0))
        .unwrap_or(0.0);
    let q3 = ca
        .quantile(0.75, QuantileMethod::Linear)
        .unwrap_or(Some(0.0))
        .unwrap_or(0.0);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    let mask: BooleanChunked = ca
        .into_iter()
        .map(|opt| Some(opt.map_or(false, |v| v >= lower && v <= upper)))
        .collect();

    Ok(df.filter(&mask)?)
}

/// Keep rows whose absolute standard score is below the threshold.
fn filter_zscore(df: &DataFrame, column: &str, threshold: f64) -> Result<DataFrame> {
    let ca = numeric_column(df, column)?;

    let mean = ca.mean().unwrap_or(0.0);
    // Population std: the score is descriptive of this dataset, not an
    // estimate for a larger one.
    let std = ca.std(0).unwrap_or(0.0);
    if std == 0.0 {
        // Constant column: nothing is an outlier.
        return Ok(df.clone());
    }

    let mask: BooleanChunked = ca
        .into_iter()
        .map(|opt| Some(opt.map_or(false, |v| ((v - mean) / std).abs() < threshold)))
        .collect();

    Ok(df.filter(&mask)?)
}

fn numeric_column(df: &DataFrame, column: &str) -> Result<Float64Chunked> {
    let series = df.column(column)?.as_materialized_series().clone();
    series
        .f64()
        .map(|ca| ca.clone())
        .map_err(|e| CleanError::Column {
            column: column.to_string(),
            reason: format!("outlier filter needs a numeric column: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::config::CleaningConfig;

    fn frame(values: &[f64]) -> DataFrame {
        DataFrame::new(vec![Column::new("x".into(), values)]).unwrap()
    }

    #[test]
    fn test_iqr_removes_extreme_value() {
        let df = frame(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 1000.0]);
        let config = CleaningConfig::new()
            .with_outlier_removal(OutlierMethod::Iqr, 1.5)
            .with_numeric_columns(&["x"]);
        let mut report = CleaningReport::new();

        let result = remove_outliers(&df, &config, &mut report).unwrap();

        assert_eq!(result.height(), 9);
        assert_eq!(report.outliers_removed, 1);
        assert_eq!(report.rows_removed, 1);
    }

    #[test]
    fn test_iqr_idempotent_on_filtered_output() {
        let df = frame(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 1000.0]);
        let config = CleaningConfig::new()
            .with_outlier_removal(OutlierMethod::Iqr, 1.5)
            .with_numeric_columns(&["x"]);

        let mut report = CleaningReport::new();
        let once = remove_outliers(&df, &config, &mut report).unwrap();
        let mut report2 = CleaningReport::new();
        let twice = remove_outliers(&once, &config, &mut report2).unwrap();

        assert_eq!(once.height(), twice.height());
        assert_eq!(report2.outliers_removed, 0);
    }

    #[test]
    fn test_zscore_filtering() {
        let df = frame(&[1.0, 1.1, 0.9, 1.05, 0.95, 50.0]);
        let config = CleaningConfig::new()
            .with_outlier_removal(OutlierMethod::Zscore, 2.0)
            .with_numeric_columns(&["x"]);
        let mut report = CleaningReport::new();

        let result = remove_outliers(&df, &config, &mut report).unwrap();
        assert_eq!(result.height(), 5);
    }

    #[test]
    fn test_zscore_uses_population_std() {
        // With mean 4: population std ~3.162 puts 10 at |z| ~1.90, past the
        // 1.8 cutoff; sample std ~3.536 would keep it at ~1.70.
        let df = frame(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        let config = CleaningConfig::new()
            .with_outlier_removal(OutlierMethod::Zscore, 1.8)
            .with_numeric_columns(&["x"]);
        let mut report = CleaningReport::new();

        let result = remove_outliers(&df, &config, &mut report).unwrap();
        assert_eq!(result.height(), 4);
        assert_eq!(report.outliers_removed, 1);
    }

    #[test]
    fn test_no_numeric_columns_is_noop() {
        let df = frame(&[1.0, 2.0, 1000.0]);
        let config = CleaningConfig::new().with_outlier_removal(OutlierMethod::Iqr, 1.5);
        let mut report = CleaningReport::new();

        let result = remove_outliers(&df, &config, &mut report).unwrap();
        assert_eq!(result.height(), 3);
        assert_eq!(report.outliers_removed, 0);
    }

    #[test]
    fn test_missing_value_fails_bound() {
        let df = DataFrame::new(vec![Column::new(
            "x".into(),
            &[Some(1.0), Some(2.0), None, Some(3.0)],
        )])
        .unwrap();
        let config = CleaningConfig::new()
            .with_outlier_removal(OutlierMethod::Iqr, 1.5)
            .with_numeric_columns(&["x"]);
        let mut report = CleaningReport::new();

        let result = remove_outliers(&df, &config, &mut report).unwrap();
        assert_eq!(result.height(), 3);
    }
}
