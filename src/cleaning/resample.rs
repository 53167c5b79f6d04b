//! Class-imbalance correction

use super::config::CleaningConfig;
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use ndarray::Array2;
use polars::prelude::*;
use rand::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, warn};

/// Ordered distance for the k-nearest heap
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Synthetic minority oversampling: interpolates between a minority sample
/// and one of its nearest same-class neighbors until classes are balanced.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: Option<u64>,
}

impl Smote {
    /// Create a new sampler with the default neighbor count
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: None,
        }
    }

    /// Set the neighbor count (at least 1)
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// k nearest same-class rows, excluding the sample itself.
    fn find_neighbors(point: &[f64], data: &[Vec<f64>], k: usize) -> Vec<usize> {
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, d) in data.iter().enumerate() {
            let dist = Self::distance(point, d);
            if dist <= 0.0 {
                continue;
            }
            if heap.len() < k {
                heap.push(DistIdx(dist, i));
            } else if let Some(&DistIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistIdx(_, i)| i).collect()
    }

    /// Oversample every minority class up to the majority count.
    /// Returns the original rows followed by the synthetic rows.
    pub fn fit_resample(&self, x: &Array2<f64>, y: &[i64]) -> Result<(Array2<f64>, Vec<i64>)> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }
        if counts.len() < 2 {
            return Err(CleanError::Unexpected(
                "smote needs at least 2 classes".to_string(),
            ));
        }
        let max_count = *counts.values().max().unwrap();

        let mut indices: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, &label) in y.iter().enumerate() {
            indices.entry(label).or_default().push(i);
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n_features = x.ncols();
        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();

        // Deterministic class order for reproducible output
        let mut classes: Vec<i64> = counts.keys().copied().collect();
        classes.sort_unstable();

        for class in classes {
            let current = counts[&class];
            let n_to_generate = max_count - current;
            if n_to_generate == 0 {
                continue;
            }

            let class_idx = &indices[&class];
            let class_samples: Vec<Vec<f64>> = class_idx
                .iter()
                .map(|&i| x.row(i).iter().copied().collect())
                .collect();

            let k = self.k_neighbors.min(class_samples.len().saturating_sub(1)).max(1);

            for _ in 0..n_to_generate {
                let idx = rng.gen_range(0..class_samples.len());
                let sample = &class_samples[idx];
                let neighbors = Self::find_neighbors(sample, &class_samples, k);

                let row = if neighbors.is_empty() {
                    // Singleton class (or all duplicates): replicate the sample
                    sample.clone()
                } else {
                    let neighbor = &class_samples[neighbors[rng.gen_range(0..neighbors.len())]];
                    let gap: f64 = rng.gen();
                    sample
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&p, &n)| p + gap * (n - p))
                        .collect()
                };
                synthetic_x.push(row);
                synthetic_y.push(class);
            }
        }

        let n_original = x.nrows();
        let n_total = n_original + synthetic_x.len();
        let result_x = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });

        let mut result_y: Vec<i64> = y.to_vec();
        result_y.extend_from_slice(&synthetic_y);

        Ok((result_x, result_y))
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline stage: oversample minority classes of the declared target,
/// replacing the dataset with the resampled features plus target.
///
/// No-op when no target is declared or the target is absent; degrades with a
/// recorded reason when the feature block is not fully numeric or only one
/// class is present.
pub fn handle_imbalance(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let Some(target) = &config.target_column else {
        return Ok(df.clone());
    };
    if df.column(target.as_str()).is_err() {
        return Ok(df.clone());
    }

    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .filter(|n| n != target)
        .collect();

    let non_numeric: Vec<&String> = feature_names
        .iter()
        .filter(|n| {
            df.column(n.as_str())
                .map(|c| c.dtype() != &DataType::Float64)
                .unwrap_or(true)
        })
        .collect();
    if !non_numeric.is_empty() {
        let reason = format!(
            "feature columns are not numeric ({}); resampling skipped",
            non_numeric
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        warn!(%reason, "smote skipped");
        report.record_fallback("imbalance", reason);
        return Ok(df.clone());
    }

    let x = super::missing::numeric_block(df, &feature_names)?;
    if x.iter().any(|v| v.is_nan()) {
        let reason = "feature columns still contain missing values; resampling skipped".to_string();
        warn!(%reason, "smote skipped");
        report.record_fallback("imbalance", reason);
        return Ok(df.clone());
    }

    let target_series = df.column(target.as_str())?.as_materialized_series().clone();
    let (codes, labels) = encode_target(&target_series, target)?;

    if labels.len() < 2 {
        let reason = "target has a single class; resampling skipped".to_string();
        warn!(%reason, "smote skipped");
        report.record_fallback("imbalance", reason);
        return Ok(df.clone());
    }

    let smote = match config.random_state {
        Some(seed) => Smote::new().with_seed(seed),
        None => Smote::new(),
    };
    let (resampled_x, resampled_y) = smote.fit_resample(&x, &codes)?;

    let mut columns = Vec::with_capacity(feature_names.len() + 1);
    for (j, name) in feature_names.iter().enumerate() {
        let values: Vec<f64> = (0..resampled_x.nrows())
            .map(|i| resampled_x[[i, j]])
            .collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    columns.push(decode_target(&resampled_y, &labels, &target_series, target)?);

    let result = DataFrame::new(columns)?;
    debug!(
        original = df.height(),
        resampled = result.height(),
        "imbalance correction done"
    );

    Ok(result)
}

/// Map target labels onto dense integer codes, keeping original labels for
/// the return trip.
fn encode_target(series: &Series, name: &str) -> Result<(Vec<i64>, Vec<String>)> {
    let keys: Vec<String> = if let Ok(ca) = series.str() {
        ca.into_iter()
            .map(|v| v.unwrap_or("missing").to_string())
            .collect()
    } else {
        let ca = series.f64().map_err(|e| CleanError::Column {
            column: name.to_string(),
            reason: e.to_string(),
        })?;
        ca.into_iter()
            .map(|v| v.map(|x| x.to_string()).unwrap_or_else(|| "missing".to_string()))
            .collect()
    };

    let labels: Vec<String> = keys
        .iter()
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<&String, i64> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l, i as i64))
        .collect();
    let codes: Vec<i64> = keys.iter().map(|k| index[k]).collect();

    Ok((codes, labels))
}

/// Rebuild the target column with its original dtype.
fn decode_target(
    codes: &[i64],
    labels: &[String],
    original: &Series,
    name: &str,
) -> Result<Column> {
    if original.str().is_ok() {
        let values: Vec<String> = codes.iter().map(|&c| labels[c as usize].clone()).collect();
        Ok(Column::new(name.into(), values))
    } else {
        let values: Vec<f64> = codes
            .iter()
            .map(|&c| {
                labels[c as usize].parse::<f64>().map_err(|e| CleanError::Column {
                    column: name.to_string(),
                    reason: format!("target label round trip failed: {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Column::new(name.into(), values))
    }
}
