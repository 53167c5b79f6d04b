//! Missing-value normalization, numeric coercion, and imputation

use super::config::{CleaningConfig, ImputationMethod};
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use crate::imputation::{KnnImputer, MatrixImputer};
use ndarray::Array2;
use polars::prelude::*;
use tracing::{debug, warn};

/// Sentinel tokens treated as missing, compared trimmed and lowercased.
/// "we dont have comf" is a recurring artifact in the source datasets.
const MISSING_SENTINELS: &[&str] = &[
    "", "na", "n/a", "nan", "null", "none", "missing", "?", "-", ".", "we dont have comf",
];

/// Whether a raw cell representation means "missing".
fn is_sentinel(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    MISSING_SENTINELS.contains(&normalized.as_str())
}

/// Replace every sentinel cell with a canonical null, across all columns
/// regardless of declared type. Runs before numeric coercion so dirty tokens
/// in numeric-declared columns become nulls rather than parse failures.
pub fn normalize_sentinels(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let Ok(ca) = series.str() else {
            // Already typed (non-string) columns carry nulls natively.
            continue;
        };

        let normalized: StringChunked = ca
            .into_iter()
            .map(|opt| opt.and_then(|v| if is_sentinel(v) { None } else { Some(v) }))
            .collect();

        result = result
            .with_column(normalized.with_name(series.name().clone()).into_series())?
            .clone();
    }

    Ok(result)
}

/// cells like "12,5" use a comma decimal separator
fn is_comma_decimal(value: &str) -> bool {
    match value.split_once(',') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Best-effort parse of one cell to f64.
///
/// Rewrites a comma decimal separator first; if the plain parse fails, a more
/// aggressive pass strips every non-digit, non-period character and retries.
/// Persistent failures become missing rather than errors.
fn coerce_cell(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let candidate = if is_comma_decimal(trimmed) {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    if let Ok(v) = candidate.parse::<f64>() {
        return Some(v);
    }

    let stripped: String = candidate
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    stripped.parse::<f64>().ok()
}

/// Parse every declared numeric column into Float64, unparseable cells to
/// null. Columns absent from the frame are skipped.
pub fn coerce_numeric(df: &DataFrame, numeric_columns: &[String]) -> Result<DataFrame> {
    let mut result = df.clone();

    for name in numeric_columns {
        let Ok(col) = df.column(name.as_str()) else {
            continue;
        };
        let series = col.as_materialized_series();

        let coerced: Float64Chunked = match series.str() {
            Ok(ca) => ca
                .into_iter()
                .map(|opt| opt.and_then(coerce_cell))
                .collect(),
            Err(_) => series
                .cast(&DataType::Float64)
                .map_err(|e| CleanError::Column {
                    column: name.clone(),
                    reason: e.to_string(),
                })?
                .f64()
                .map_err(|e| CleanError::Column {
                    column: name.clone(),
                    reason: e.to_string(),
                })?
                .clone(),
        };

        result = result
            .with_column(coerced.with_name(series.name().clone()).into_series())?
            .clone();
    }

    Ok(result)
}

/// Fill missing values per declared column type, then sweep the whole frame
/// so zero missing cells remain. Every fill increments the report's
/// per-column counter; degradations are recorded, never raised.
pub fn impute(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let mut result = df.clone();

    let numeric_present: Vec<String> = config
        .numeric_columns
        .iter()
        .filter(|c| result.column(c.as_str()).is_ok())
        .cloned()
        .collect();

    if !numeric_present.is_empty() {
        result = match config.imputation_method {
            ImputationMethod::Knn => impute_numeric_knn(&result, &numeric_present, report)?,
            method => impute_numeric_columnwise(&result, &numeric_present, method, report)?,
        };
    }

    result = impute_categorical(&result, &config.categorical_columns, report)?;
    result = impute_text(&result, &config.text_columns, report)?;
    result = final_sweep(&result, report)?;

    Ok(result)
}

/// Joint neighbor-based imputation over all numeric columns, median fallback
/// when KNN cannot run.
fn impute_numeric_knn(
    df: &DataFrame,
    columns: &[String],
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let matrix = numeric_block(df, columns)?;
    let complete = KnnImputer::complete_row_count(&matrix);

    if complete < 2 {
        let reason = format!("{complete} fully observed rows, knn needs 2; using median");
        warn!(%reason, "knn imputation disqualified");
        report.record_fallback("imputation", reason);
        return impute_numeric_columnwise(df, columns, ImputationMethod::Median, report);
    }

    // Record what we are about to fill before the matrix loses its nulls.
    let missing_counts: Vec<usize> = columns
        .iter()
        .map(|name| {
            df.column(name.as_str())
                .map(|c| c.as_materialized_series().null_count())
                .unwrap_or(0)
        })
        .collect();

    let n_neighbors = complete.min(5);
    let mut imputer = KnnImputer::new(n_neighbors);
    let filled = match imputer.fit_transform(&matrix) {
        Ok(filled) => filled,
        Err(e) => {
            let reason = format!("knn failed ({e}); using median");
            warn!(%reason, "knn imputation fell back");
            report.record_fallback("imputation", reason);
            return impute_numeric_columnwise(df, columns, ImputationMethod::Median, report);
        }
    };

    let mut result = df.clone();
    for (j, name) in columns.iter().enumerate() {
        report.record_imputed(name, missing_counts[j]);
        let values: Vec<f64> = (0..filled.nrows()).map(|i| filled[[i, j]]).collect();
        let series = Float64Chunked::from_vec(name.as_str().into(), values).into_series();
        result = result.with_column(series)?.clone();
    }

    debug!(columns = columns.len(), n_neighbors, "knn imputation done");
    Ok(result)
}

/// Per-column statistic fill for mean / median / zero strategies.
fn impute_numeric_columnwise(
    df: &DataFrame,
    columns: &[String],
    method: ImputationMethod,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let mut result = df.clone();

    for name in columns {
        let series = result.column(name.as_str())?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            continue;
        }

        let ca = series.f64().map_err(|e| CleanError::Column {
            column: name.clone(),
            reason: e.to_string(),
        })?;

        let fill = match method {
            ImputationMethod::Mean => ca.mean(),
            ImputationMethod::Median | ImputationMethod::Knn => ca.median(),
            ImputationMethod::Zero => Some(0.0),
        };
        // A statistic over an all-missing column has no value; the final
        // sweep settles those columns.
        let Some(fill) = fill else {
            continue;
        };

        report.record_imputed(name, missing);
        let filled: Float64Chunked = ca.into_iter().map(|opt| opt.or(Some(fill))).collect();
        result = result
            .with_column(filled.with_name(series.name().clone()).into_series())?
            .clone();
    }

    Ok(result)
}

/// Mode fill for categorical columns, "missing" when the column has no mode.
fn impute_categorical(
    df: &DataFrame,
    columns: &[String],
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let mut result = df.clone();

    for name in columns {
        let Ok(col) = result.column(name.as_str()) else {
            continue;
        };
        let series = col.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            continue;
        }

        let fill = match series.str() {
            Ok(ca) => string_mode(ca).unwrap_or_else(|| "missing".to_string()),
            Err(_) => "missing".to_string(),
        };

        report.record_imputed(name, missing);
        let ca = series.str().map_err(|e| CleanError::Column {
            column: name.clone(),
            reason: e.to_string(),
        })?;
        let filled: StringChunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(fill.as_str()).to_string()))
            .collect();
        result = result
            .with_column(filled.with_name(series.name().clone()).into_series())?
            .clone();
    }

    Ok(result)
}

/// Empty-string fill for text columns, then strip leading `*` markers from
/// every value (a cleaning convention inherited from the source format).
fn impute_text(
    df: &DataFrame,
    columns: &[String],
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let mut result = df.clone();

    for name in columns {
        let Ok(col) = result.column(name.as_str()) else {
            continue;
        };
        let series = col.as_materialized_series().clone();
        let missing = series.null_count();

        let ca = series.str().map_err(|e| CleanError::Column {
            column: name.clone(),
            reason: e.to_string(),
        })?;

        report.record_imputed(name, missing);
        let filled: StringChunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or("").trim_start_matches('*').to_string()))
            .collect();
        result = result
            .with_column(filled.with_name(series.name().clone()).into_series())?
            .clone();
    }

    Ok(result)
}

/// Guarantee zero remaining missing values dataset-wide: numeric columns get
/// their median (0.0 when the whole column is missing), everything else gets
/// the literal "missing".
pub fn final_sweep(df: &DataFrame, report: &mut CleaningReport) -> Result<DataFrame> {
    let mut result = df.clone();
    let names: Vec<String> = result
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in &names {
        let series = result.column(name.as_str())?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            continue;
        }

        report.record_imputed(name, missing);

        if let Ok(ca) = series.f64() {
            let fill = match ca.median() {
                Some(m) => m,
                None => {
                    report.record_fallback(
                        "imputation",
                        format!("column '{name}' is entirely missing; filled with 0"),
                    );
                    0.0
                }
            };
            let filled: Float64Chunked = ca.into_iter().map(|opt| opt.or(Some(fill))).collect();
            result = result
                .with_column(filled.with_name(series.name().clone()).into_series())?
                .clone();
        } else if let Ok(ca) = series.str() {
            let filled: StringChunked = ca
                .into_iter()
                .map(|opt| Some(opt.unwrap_or("missing").to_string()))
                .collect();
            result = result
                .with_column(filled.with_name(series.name().clone()).into_series())?
                .clone();
        }
    }

    Ok(result)
}

/// Most frequent non-null value; ties break lexicographically for
/// deterministic output.
fn string_mode(ca: &StringChunked) -> Option<String> {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
}

/// Declared numeric columns as a dense matrix, nulls as NaN.
pub fn numeric_block(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut matrix = Array2::from_elem((n_rows, columns.len()), f64::NAN);

    for (j, name) in columns.iter().enumerate() {
        let series = df.column(name.as_str())?.as_materialized_series().clone();
        let ca = series.f64().map_err(|e| CleanError::Column {
            column: name.clone(),
            reason: e.to_string(),
        })?;
        for (i, opt) in ca.into_iter().enumerate() {
            if let Some(v) = opt {
                matrix[[i, j]] = v;
            }
        }
    }

    Ok(matrix)
}
