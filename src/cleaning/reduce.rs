//! Dimensionality reduction

use super::config::CleaningConfig;
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Principal-component projection onto the top-k directions of maximal
/// variance, extracted by power iteration with deflation.
#[derive(Debug, Clone)]
pub struct Pca {
    n_components: usize,
    seed: u64,
}

impl Pca {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components: n_components.max(1),
            seed: 42,
        }
    }

    /// Set the power-iteration initialization seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Center the data and project it onto the top components.
    /// Output shape: (n_samples, min(n_components, n_features)).
    pub fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let n = data.nrows();
        let d = data.ncols();
        if n < 2 {
            return Err(CleanError::Unexpected(
                "pca requires at least 2 samples".to_string(),
            ));
        }
        if d < 1 {
            return Err(CleanError::Unexpected(
                "pca requires at least 1 feature".to_string(),
            ));
        }

        let k = self.n_components.min(d).min(n);

        let means = data
            .mean_axis(Axis(0))
            .ok_or_else(|| CleanError::Unexpected("failed to compute column means".to_string()))?;
        let centered = data - &means;

        let cov = self.covariance(&centered);
        let components = self.power_iteration(&cov, d, k);

        let mut projected = Array2::zeros((n, k));
        for (i, sample) in centered.rows().into_iter().enumerate() {
            for (c, component) in components.iter().enumerate() {
                projected[[i, c]] = sample.dot(component);
            }
        }

        Ok(projected)
    }

    fn covariance(&self, centered: &Array2<f64>) -> Array2<f64> {
        let n = centered.nrows() as f64;
        centered.t().dot(centered) / (n - 1.0).max(1.0)
    }

    /// Extract the top-k eigenvectors, deflating after each one.
    fn power_iteration(&self, cov: &Array2<f64>, d: usize, k: usize) -> Vec<Array1<f64>> {
        let max_iter = 300;
        let tol = 1e-10;

        let mut work = cov.clone();
        let mut components = Vec::with_capacity(k);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for _ in 0..k {
            let mut v: Array1<f64> = Array1::from_iter((0..d).map(|_| rng.gen_range(-1.0..1.0)));
            let norm = v.dot(&v).sqrt().max(1e-12);
            v.mapv_inplace(|x| x / norm);

            let mut eigenvalue = 0.0f64;

            for _ in 0..max_iter {
                let w = work.dot(&v);
                let new_eigenvalue = v.dot(&w);
                let w_norm = w.dot(&w).sqrt().max(1e-12);
                let new_v = w / w_norm;

                let diff = (&v - &new_v).mapv(|x| x * x).sum().sqrt();
                v = new_v;
                eigenvalue = new_eigenvalue;
                if diff < tol {
                    break;
                }
            }

            let eigenvalue = eigenvalue.max(0.0);

            // Deflate: A = A - lambda * v * v^T
            for i in 0..d {
                for j in 0..d {
                    work[[i, j]] -= eigenvalue * v[i] * v[j];
                }
            }

            components.push(v);
        }

        components
    }
}

/// Pipeline stage: project the declared numeric block onto `n_components`
/// orthogonal directions, replacing the original columns with
/// `pca_0..pca_{N-1}`. No-op when the block is already small enough.
pub fn reduce_dimensions(
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

    if present.is_empty() || present.len() <= config.n_components {
        return Ok(df.clone());
    }

    let matrix = super::missing::numeric_block(df, &present)?;
    if matrix.iter().any(|v| v.is_nan()) {
        let reason = "numeric columns still contain missing values; reduction skipped".to_string();
        warn!(%reason, "pca skipped");
        report.record_fallback("reduction", reason);
        return Ok(df.clone());
    }

    let pca = Pca::new(config.n_components).with_seed(config.random_state.unwrap_or(42));
    let projected = pca.fit_transform(&matrix)?;

    let mut result = df.clone();
    for name in &present {
        result = result.drop(name.as_str())?;
    }

    let mut columns = Vec::with_capacity(projected.ncols());
    for c in 0..projected.ncols() {
        let values: Vec<f64> = (0..projected.nrows()).map(|i| projected[[i, c]]).collect();
        columns.push(Column::new(format!("pca_{c}").as_str().into(), values));
    }
    result = result.hstack(&columns)?;

    report.columns_processed += present.len();
    debug!(
        from = present.len(),
        to = projected.ncols(),
        "pca reduction done"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pca_projects_to_requested_components() {
        let data = Array2::from_shape_vec(
            (5, 3),
            vec![
                1.0, 2.0, 0.5, 2.0, 4.0, 0.3, 3.0, 6.0, 0.8, 4.0, 8.0, 0.4, 5.0, 10.0, 0.6,
            ],
        )
        .unwrap();

        let pca = Pca::new(2);
        let projected = pca.fit_transform(&data).unwrap();
        assert_eq!(projected.nrows(), 5);
        assert_eq!(projected.ncols(), 2);
    }

    #[test]
    fn test_pca_first_component_captures_linear_data() {
        // Perfectly correlated features: the first component should carry
        // nearly all the spread, the second nearly none.
        let data = Array2::from_shape_vec(
            (5, 2),
            vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0, 4.0, 8.0, 5.0, 10.0],
        )
        .unwrap();

        let pca = Pca::new(2);
        let projected = pca.fit_transform(&data).unwrap();

        let spread = |c: usize| -> f64 {
            let col: Vec<f64> = (0..5).map(|i| projected[[i, c]]).collect();
            let mean = col.iter().sum::<f64>() / 5.0;
            col.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        };
        assert!(spread(0) > 100.0 * spread(1).max(1e-12));
    }

    #[test]
    fn test_pca_too_few_samples() {
        let data = Array2::from_shape_vec((1, 2), vec![1.0, 2.0]).unwrap();
        assert!(Pca::new(1).fit_transform(&data).is_err());
    }

    #[test]
    fn test_stage_replaces_numeric_block() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::new("b".into(), &[2.0, 4.0, 6.0, 8.0, 10.0]),
            Column::new("c".into(), &[5.0, 3.0, 8.0, 1.0, 9.0]),
            Column::new("d".into(), &[0.1, 0.5, 0.3, 0.8, 0.2]),
            Column::new("e".into(), &[9.0, 7.0, 5.0, 3.0, 1.0]),
            Column::new("keep".into(), &["x", "y", "z", "w", "v"]),
        ])
        .unwrap();

        let config = CleaningConfig::new()
            .with_reduction(2)
            .with_numeric_columns(&["a", "b", "c", "d", "e"]);
        let mut report = CleaningReport::new();

        let result = reduce_dimensions(&df, &config, &mut report).unwrap();

        assert!(result.column("pca_0").is_ok());
        assert!(result.column("pca_1").is_ok());
        assert!(result.column("pca_2").is_err());
        for original in ["a", "b", "c", "d", "e"] {
            assert!(result.column(original).is_err());
        }
        assert!(result.column("keep").is_ok());
        assert_eq!(report.columns_processed, 5);
    }

    #[test]
    fn test_stage_skips_block_with_missing_values() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1.0), None, Some(3.0), Some(5.0)]),
            Column::new("b".into(), &[2.0, 4.0, 6.0, 8.0]),
        ])
        .unwrap();

        let config = CleaningConfig::new()
            .with_reduction(1)
            .with_numeric_columns(&["a", "b"]);
        let mut report = CleaningReport::new();

        let result = reduce_dimensions(&df, &config, &mut report).unwrap();

        // Original columns survive and nothing non-finite is emitted
        assert!(result.column("a").is_ok());
        assert!(result.column("pca_0").is_err());
        assert_eq!(report.fallbacks.len(), 1);
        assert_eq!(report.fallbacks[0].stage, "reduction");
    }

    #[test]
    fn test_stage_noop_when_block_small() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[1.0, 2.0, 3.0]),
            Column::new("b".into(), &[4.0, 5.0, 6.0]),
        ])
        .unwrap();

        let config = CleaningConfig::new()
            .with_reduction(5)
            .with_numeric_columns(&["a", "b"]);
        let mut report = CleaningReport::new();

        let result = reduce_dimensions(&df, &config, &mut report).unwrap();
        assert!(result.column("a").is_ok());
        assert!(result.column("pca_0").is_err());
    }
}
