//! KNN-based imputation over the numeric block

use crate::error::{CleanError, Result};
use crate::imputation::{is_missing, MatrixImputer};
use ndarray::{Array1, Array2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered distance for the k-nearest heap
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap by distance so the farthest neighbor is popped first
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Neighbor-based imputer fitted on fully observed rows.
///
/// Distances are nan-aware euclidean means over the positions both rows have
/// observed, so a row missing several features still finds neighbors.
#[derive(Debug, Clone)]
pub struct KnnImputer {
    n_neighbors: usize,
    complete_data: Option<Array2<f64>>,
    feature_means: Option<Array1<f64>>,
}

impl KnnImputer {
    /// Create a new imputer with the given neighbor count (at least 1).
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            complete_data: None,
            feature_means: None,
        }
    }

    /// Number of fully observed rows in a matrix.
    pub fn complete_row_count(x: &Array2<f64>) -> usize {
        x.rows()
            .into_iter()
            .filter(|row| !row.iter().any(|&v| is_missing(v)))
            .count()
    }

    /// Mean distance over mutually observed positions, infinity if none.
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;

        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            count += 1;
            let d = ai - bi;
            accum += d * d;
        }

        if count == 0 {
            f64::INFINITY
        } else {
            (accum / count as f64).sqrt()
        }
    }

    /// Find k nearest complete rows for a sample.
    fn find_neighbors(&self, sample: &[f64], k: usize) -> Vec<(usize, f64)> {
        let data = self.complete_data.as_ref().unwrap();
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);

        for (i, row) in data.rows().into_iter().enumerate() {
            let row_vec: Vec<f64> = row.iter().copied().collect();
            let dist = Self::distance(sample, &row_vec);

            if !dist.is_finite() {
                continue;
            }
            if heap.len() < k {
                heap.push(DistanceIdx(dist, i));
            } else if let Some(&DistanceIdx(max_dist, _)) = heap.peek() {
                if dist < max_dist {
                    heap.pop();
                    heap.push(DistanceIdx(dist, i));
                }
            }
        }

        heap.into_iter().map(|DistanceIdx(d, i)| (i, d)).collect()
    }

    /// Average a feature over the neighbors, falling back to the feature mean.
    fn impute_value(&self, neighbors: &[(usize, f64)], feature_idx: usize) -> f64 {
        let data = self.complete_data.as_ref().unwrap();

        if neighbors.is_empty() {
            return self
                .feature_means
                .as_ref()
                .map(|m| m[feature_idx])
                .unwrap_or(0.0);
        }

        let sum: f64 = neighbors
            .iter()
            .map(|&(idx, _)| data[[idx, feature_idx]])
            .sum();
        sum / neighbors.len() as f64
    }
}

impl Default for KnnImputer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl MatrixImputer for KnnImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let complete_rows: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        // KNN needs at least 2 reference rows to be meaningful.
        if complete_rows.len() < 2 {
            return Err(CleanError::Unexpected(format!(
                "knn imputation needs at least 2 fully observed rows, found {}",
                complete_rows.len()
            )));
        }

        let n_features = x.ncols();
        let mut complete_data = Array2::zeros((complete_rows.len(), n_features));
        for (i, &row_idx) in complete_rows.iter().enumerate() {
            for j in 0..n_features {
                complete_data[[i, j]] = x[[row_idx, j]];
            }
        }

        let feature_means = complete_data
            .mean_axis(ndarray::Axis(0))
            .ok_or_else(|| CleanError::Unexpected("failed to compute feature means".to_string()))?;

        self.complete_data = Some(complete_data);
        self.feature_means = Some(feature_means);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.complete_data.is_none() {
            return Err(CleanError::Unexpected("knn imputer not fitted".to_string()));
        }

        let mut result = x.clone();
        let n_features = x.ncols();

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            let row_vec: Vec<f64> = row.iter().copied().collect();
            let neighbors = self.find_neighbors(&row_vec, self.n_neighbors);

            for j in 0..n_features {
                if is_missing(row_vec[j]) {
                    result[[row_idx, j]] = self.impute_value(&neighbors, j);
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knn_fills_all_missing() {
        let data = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0,
                10.0,
                2.0,
                20.0,
                3.0,
                30.0,
                4.0,
                40.0,
                f64::NAN,
                25.0,
                2.5,
                f64::NAN,
            ],
        )
        .unwrap();

        let mut imputer = KnnImputer::new(3);
        let result = imputer.fit_transform(&data).unwrap();

        assert!(!result.iter().any(|&v| v.is_nan()));
        // Imputed values should land inside the observed range
        assert!(result[[4, 0]] >= 1.0 && result[[4, 0]] <= 4.0);
        assert!(result[[5, 1]] >= 10.0 && result[[5, 1]] <= 40.0);
    }

    #[test]
    fn test_knn_rejects_too_few_complete_rows() {
        let data = Array2::from_shape_vec(
            (3, 2),
            vec![1.0, f64::NAN, f64::NAN, 2.0, 3.0, 4.0],
        )
        .unwrap();

        let mut imputer = KnnImputer::new(5);
        assert!(imputer.fit(&data).is_err());
    }

    #[test]
    fn test_complete_row_count() {
        let data =
            Array2::from_shape_vec((3, 2), vec![1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(KnnImputer::complete_row_count(&data), 2);
    }
}
