//! Matrix-level imputation
//!
//! The KNN strategy operates on the whole numeric block at once (all declared
//! numeric columns jointly), so it lives here as an `ndarray`-level component
//! rather than inside the per-column imputation code.

mod knn;

pub use knn::KnnImputer;

use crate::error::Result;
use ndarray::Array2;

/// Trait for imputers that fill a numeric matrix
pub trait MatrixImputer: Send + Sync {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
