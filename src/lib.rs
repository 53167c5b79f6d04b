//! tabclean - Configurable cleaning pipeline for tabular datasets
//!
//! This crate turns messy delimited data into model-ready features through a
//! fixed sequence of independently gated stages:
//! - Sentinel normalization and numeric coercion
//! - Missing value imputation (mean, median, KNN, zero)
//! - Outlier removal (IQR, z-score)
//! - Feature scaling (standard, min-max)
//! - Categorical encoding (one-hot, label)
//! - Text cleanup and TF-IDF vectorization
//! - Dimensionality reduction (PCA)
//! - Class imbalance correction (SMOTE)
//! - Duplicate removal
//!
//! Every run produces the cleaned dataset plus a [`cleaning::CleaningReport`]
//! describing exactly what was changed, including any stages that degraded to
//! a fallback behavior.
//!
//! # Modules
//! - [`cleaning`] - Pipeline stages and orchestration
//! - [`imputation`] - Matrix-level imputation backends
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV ingest and serialization
//!
//! # Example
//! ```no_run
//! use tabclean::cleaning::{AdvancedCleaner, CleaningConfig, ImputationMethod};
//!
//! let config = CleaningConfig::new()
//!     .with_imputation(ImputationMethod::Median)
//!     .with_numeric_columns(&["age", "income"]);
//!
//! let mut cleaner = AdvancedCleaner::new(config);
//! let outcome = cleaner.clean(b"age,income\n34,51000\nNA,62000\n")?;
//! println!("{}", outcome.csv);
//! # Ok::<(), tabclean::error::CleanError>(())
//! ```

pub mod error;

pub mod cleaning;
pub mod imputation;

pub mod cli;
pub mod utils;

pub use cleaning::{AdvancedCleaner, CleanOutcome, CleaningConfig, CleaningReport};
pub use error::{CleanError, Result};
