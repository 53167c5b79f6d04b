//! Categorical encoding

use super::config::{CleaningConfig, EncodingMethod};
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Drop-first one-hot encoder.
///
/// A column with k distinct values expands into k-1 indicator columns; the
/// lexicographically first level is the dropped reference.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    /// Retained levels per column, in indicator order
    levels: HashMap<String, Vec<String>>,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn sorted category levels for each column.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let series = df.column(col_name)?.as_materialized_series().clone();
            let ca = series.str().map_err(|e| CleanError::Column {
                column: col_name.to_string(),
                reason: e.to_string(),
            })?;

            let mut distinct: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            // Drop the first level as the reference
            if !distinct.is_empty() {
                distinct.remove(0);
            }
            self.levels.insert(col_name.to_string(), distinct);
        }
        Ok(self)
    }

    /// Replace each fitted column with its indicator columns, appended after
    /// the remaining columns. Returns the generated column names.
    pub fn transform(&self, df: &DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut result = df.clone();
        let mut generated = Vec::new();

        // Deterministic column order regardless of HashMap iteration
        let mut fitted: Vec<(&String, &Vec<String>)> = self.levels.iter().collect();
        fitted.sort_by_key(|(name, _)| name.as_str());

        for (col_name, levels) in fitted {
            let Ok(col) = result.column(col_name.as_str()) else {
                continue;
            };
            let series = col.as_materialized_series().clone();
            let ca = series.str().map_err(|e| CleanError::Column {
                column: col_name.clone(),
                reason: e.to_string(),
            })?;
            let values: Vec<Option<String>> = ca
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect();

            let mut indicators = Vec::with_capacity(levels.len());
            for level in levels {
                let name = format!("{col_name}_{level}");
                let column: Vec<f64> = values
                    .iter()
                    .map(|v| {
                        if v.as_deref() == Some(level.as_str()) {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect();
                indicators.push(Column::new(name.as_str().into(), column));
                generated.push(name);
            }

            result = result.drop(col_name.as_str())?;
            if !indicators.is_empty() {
                result = result.hstack(&indicators)?;
            }
        }

        Ok((result, generated))
    }
}

/// Dense integer codes in lexicographic category order.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the sorted class list from a column.
    pub fn fit(&mut self, ca: &StringChunked) -> &mut Self {
        self.classes = ca
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        self
    }

    /// Code for one value, if seen during fit.
    pub fn code_of(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// The learned classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode a column to Float64 codes; unseen or missing values become null.
    pub fn transform(&self, ca: &StringChunked, name: &str) -> Series {
        let coded: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.and_then(|v| self.code_of(v).map(|c| c as f64)))
            .collect();
        coded.with_name(name.into()).into_series()
    }
}

/// Pipeline stage: expand or encode the declared categorical columns.
pub fn encode_categorical(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let present: Vec<String> = config
        .categorical_columns
        .iter()
        .filter(|c| df.column(c.as_str()).is_ok())
        .cloned()
        .collect();

    if present.is_empty() {
        return Ok(df.clone());
    }

    let result = match config.encoding_method {
        EncodingMethod::Onehot => {
            let cols: Vec<&str> = present.iter().map(|s| s.as_str()).collect();
            let mut encoder = OneHotEncoder::new();
            encoder.fit(df, &cols)?;
            let (result, generated) = encoder.transform(df)?;
            debug!(
                columns = present.len(),
                indicators = generated.len(),
                "one-hot encoding done"
            );
            report.columns_encoded.extend(generated);
            result
        }
        EncodingMethod::Label => {
            let mut result = df.clone();
            for name in &present {
                let series = result.column(name.as_str())?.as_materialized_series().clone();
                let ca = series.str().map_err(|e| CleanError::Column {
                    column: name.clone(),
                    reason: e.to_string(),
                })?;
                let mut encoder = LabelEncoder::new();
                encoder.fit(ca);
                result = result.with_column(encoder.transform(ca, name))?.clone();
                report.columns_encoded.push(name.clone());
            }
            result
        }
    };

    report.columns_processed += present.len();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("city".into(), &["NYC", "LA", "NYC", "SF", "LA"]),
            Column::new("x".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_onehot_k_minus_one_columns() {
        let df = frame();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &["city"]).unwrap();
        let (result, generated) = encoder.transform(&df).unwrap();

        // 3 distinct values -> 2 indicators, "LA" dropped as reference
        assert_eq!(generated, vec!["city_NYC".to_string(), "city_SF".to_string()]);
        assert!(result.column("city").is_err());
        assert!(result.column("city_NYC").is_ok());
    }

    #[test]
    fn test_onehot_rows_sum_to_at_most_one() {
        let df = frame();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &["city"]).unwrap();
        let (result, generated) = encoder.transform(&df).unwrap();

        for i in 0..result.height() {
            let sum: f64 = generated
                .iter()
                .map(|name| {
                    result
                        .column(name)
                        .unwrap()
                        .as_materialized_series()
                        .f64()
                        .unwrap()
                        .get(i)
                        .unwrap()
                })
                .sum();
            assert!(sum <= 1.0);
        }
        // Row 1 is "LA", the dropped reference level: all indicators zero
        let sum_ref: f64 = generated
            .iter()
            .map(|name| {
                result
                    .column(name)
                    .unwrap()
                    .as_materialized_series()
                    .f64()
                    .unwrap()
                    .get(1)
                    .unwrap()
            })
            .sum();
        assert_eq!(sum_ref, 0.0);
    }

    #[test]
    fn test_label_encoder_dense_codes() {
        let ca = StringChunked::new("c".into(), &["b", "a", "c", "a"]);
        let mut encoder = LabelEncoder::new();
        encoder.fit(&ca);

        assert_eq!(encoder.classes(), &["a", "b", "c"]);
        let series = encoder.transform(&ca, "c");
        let coded = series.f64().unwrap();
        assert_eq!(coded.get(0), Some(1.0));
        assert_eq!(coded.get(1), Some(0.0));
        assert_eq!(coded.get(2), Some(2.0));
    }

    #[test]
    fn test_stage_records_encoded_columns() {
        let df = frame();
        let config = CleaningConfig::new()
            .with_encoding(EncodingMethod::Onehot)
            .with_categorical_columns(&["city"]);
        let mut report = CleaningReport::new();

        let result = encode_categorical(&df, &config, &mut report).unwrap();
        assert_eq!(report.columns_encoded.len(), 2);
        assert_eq!(report.columns_processed, 1);
        assert_eq!(result.width(), 3); // x + 2 indicators
    }
}
