//! Feature scaling

use super::config::{CleaningConfig, ScalingMethod};
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Column-independent feature scaler, fit and applied on the same dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    method: ScalingMethod,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(method: ScalingMethod) -> Self {
        Self {
            method,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let series = df.column(col_name)?.as_materialized_series().clone();
            let ca = series.f64().map_err(|e| CleanError::Column {
                column: col_name.to_string(),
                reason: e.to_string(),
            })?;

            let params = match self.method {
                ScalingMethod::Standard => {
                    let mean = ca.mean().unwrap_or(0.0);
                    let std = ca.std(1).unwrap_or(1.0);
                    ScalerParams {
                        center: mean,
                        scale: if std == 0.0 { 1.0 } else { std },
                    }
                }
                ScalingMethod::Minmax => {
                    let min = ca.min().unwrap_or(0.0);
                    let max = ca.max().unwrap_or(1.0);
                    let range = max - min;
                    ScalerParams {
                        center: min,
                        scale: if range == 0.0 { 1.0 } else { range },
                    }
                }
            };
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the fitted columns.
    /// Builds all replacement columns first, then applies them in one pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CleanError::Unexpected("scaler not fitted".to_string()));
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .filter_map(|(col_name, params)| {
                df.column(col_name).ok().map(|column| {
                    let series = column.as_materialized_series();
                    let ca = series.f64().map_err(|e| CleanError::Column {
                        column: col_name.clone(),
                        reason: e.to_string(),
                    })?;
                    let scaled: Float64Chunked = ca
                        .into_iter()
                        .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                        .collect();
                    Ok(scaled.with_name(series.name().clone()).into_series())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result = result.with_column(scaled)?.clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}

/// Pipeline stage: rescale the declared numeric columns and record them.
pub fn scale_features(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let present: Vec<String> = config
        .numeric_columns
        .iter()
        .filter(|c| df.column(c.as_str()).is_ok())
        .cloned()
        .collect();

    if present.is_empty() {
        return Ok(df.clone());
    }

    let cols: Vec<&str> = present.iter().map(|s| s.as_str()).collect();
    let mut scaler = Scaler::new(config.scaling_method);
    let result = scaler.fit_transform(df, &cols)?;

    report.columns_normalized.extend(present.iter().cloned());
    report.columns_processed += present.len();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![Column::new(
            "a".into(),
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        )])
        .unwrap()
    }

    #[test]
    fn test_standard_scaler_zero_mean() {
        let df = frame();
        let mut scaler = Scaler::new(ScalingMethod::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let ca = result.column("a").unwrap().as_materialized_series().f64().unwrap().clone();
        let mean: f64 = ca.mean().unwrap();
        assert!(mean.abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler_unit_range() {
        let df = frame();
        let mut scaler = Scaler::new(ScalingMethod::Minmax);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let ca = result.column("a").unwrap().as_materialized_series().f64().unwrap().clone();
        assert!((ca.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((ca.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[2.0, 2.0, 2.0])]).unwrap();
        let mut scaler = Scaler::new(ScalingMethod::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();
        let ca = result.column("a").unwrap().as_materialized_series().f64().unwrap().clone();
        assert!(ca.into_iter().all(|v| v.unwrap().is_finite()));
    }

    #[test]
    fn test_stage_records_normalized_columns() {
        let df = frame();
        let config = CleaningConfig::new()
            .with_scaling(ScalingMethod::Standard)
            .with_numeric_columns(&["a"]);
        let mut report = CleaningReport::new();

        scale_features(&df, &config, &mut report).unwrap();
        assert_eq!(report.columns_normalized, vec!["a".to_string()]);
        assert_eq!(report.columns_processed, 1);
    }
}
