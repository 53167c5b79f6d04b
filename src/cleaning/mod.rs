//! Advanced data cleaning pipeline
//!
//! A fixed-order sequence of optional stages driven by a declarative
//! [`CleaningConfig`], operating on one in-memory dataset per run:
//! - Missing-value normalization, numeric coercion, and imputation
//! - Outlier filtering (IQR or z-score)
//! - Feature scaling (standard or min-max)
//! - Categorical encoding (drop-first one-hot or label)
//! - Text cleanup and TF-IDF vectorization
//! - PCA dimensionality reduction
//! - SMOTE imbalance correction
//! - Exact-duplicate removal
//!
//! Every run produces the transformed dataset plus an auditable
//! [`CleaningReport`].

mod config;
mod encode;
mod missing;
mod outlier;
mod pipeline;
mod reduce;
mod report;
mod resample;
mod scale;
mod text;

pub mod prepare;

pub use config::{
    CleaningConfig, EncodingMethod, ImbalanceMethod, ImputationMethod, OutlierMethod,
    ReductionMethod, ScalingMethod, VectorizationMethod,
};
pub use encode::{LabelEncoder, OneHotEncoder};
pub use pipeline::{AdvancedCleaner, CleanOutcome};
pub use reduce::Pca;
pub use report::{CleaningReport, StageFallback};
pub use resample::Smote;
pub use scale::Scaler;
pub use text::{TextCleaner, TfidfVectorizer};
