//! Basic frame hygiene helpers
//!
//! Small pre-pipeline transformations that do not belong to any gated stage:
//! dropping degenerate columns and tracking the numeric column set across
//! encoding. The tracker is an explicit value owned by the caller, so
//! concurrent runs cannot interfere through shared state.

use crate::error::Result;
use polars::prelude::*;

/// Remove columns with a single distinct value.
pub fn drop_constant(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in names {
        let series = result.column(name.as_str())?.as_materialized_series();
        if series.n_unique().unwrap_or(0) <= 1 {
            result = result.drop(name.as_str())?;
        }
    }

    Ok(result)
}

/// Remove string columns with more than `threshold` distinct values.
pub fn drop_high_cardinality(df: &DataFrame, threshold: usize) -> Result<DataFrame> {
    let mut result = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in names {
        let series = result.column(name.as_str())?.as_materialized_series();
        if series.str().is_ok() && series.n_unique().unwrap_or(0) > threshold {
            result = result.drop(name.as_str())?;
        }
    }

    Ok(result)
}

/// Numeric column set captured before encoding renames or removes columns.
///
/// Downstream feature/target splits read this snapshot instead of inspecting
/// the (already encoded) frame.
#[derive(Debug, Clone, Default)]
pub struct NumericTracker {
    columns: Vec<String>,
}

impl NumericTracker {
    /// Capture the Float64 columns of a frame.
    pub fn capture(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::Float64)
            .map(|c| c.name().to_string())
            .collect();
        Self { columns }
    }

    /// The tracked column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
