//! Cleaning configuration

use serde::{Deserialize, Serialize};

/// Strategy for filling missing numeric values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationMethod {
    Mean,
    Median,
    Knn,
    Zero,
}

/// Statistical bound used by the outlier filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Interquartile-range fence: [Q1 - k*IQR, Q3 + k*IQR]
    Iqr,
    /// Absolute standard score below the threshold
    Zscore,
}

/// Scaling applied to numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMethod {
    /// Zero mean, unit variance
    Standard,
    /// Rescale to [0, 1]
    Minmax,
}

/// Categorical encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMethod {
    /// Drop-first indicator expansion (k categories -> k-1 columns)
    Onehot,
    /// Dense integer codes in lexicographic category order
    Label,
}

/// Text vectorization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorizationMethod {
    Tfidf,
}

/// Dimensionality reduction scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMethod {
    Pca,
}

/// Class-imbalance correction scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImbalanceMethod {
    Smote,
}

/// Declarative configuration for one cleaning run.
///
/// Deserializes from the JSON payload described in the external interface;
/// every field has a default so a partial payload is accepted, while unknown
/// keys are rejected as a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CleaningConfig {
    /// Run the imputation stage
    pub impute_missing: bool,
    pub imputation_method: ImputationMethod,

    /// Run the outlier filter
    pub remove_outliers: bool,
    pub outlier_method: OutlierMethod,
    /// IQR multiplier or z-score cutoff depending on the method
    pub outlier_threshold: f64,

    /// Run the scaler
    pub feature_scaling: bool,
    pub scaling_method: ScalingMethod,

    /// Run the categorical encoder
    pub encode_categorical: bool,
    pub encoding_method: EncodingMethod,

    /// Run the text processor
    pub text_processing: bool,
    pub remove_stopwords: bool,
    pub lemmatize: bool,
    pub text_vectorization: VectorizationMethod,
    /// Cap on generated TF-IDF feature columns per text column
    pub max_text_features: usize,

    /// Run the dimensionality reducer
    pub dimensionality_reduction: bool,
    pub reduction_method: ReductionMethod,
    pub n_components: usize,

    /// Run the imbalance corrector
    pub handle_imbalance: bool,
    pub imbalance_method: ImbalanceMethod,

    /// Designated target column for resampling
    pub target_column: Option<String>,

    /// Declared column roles
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub datetime_columns: Vec<String>,

    /// Columns the caller believes the dataset has; used purely for validation
    pub available_columns: Vec<String>,

    /// Random seed for SMOTE and PCA initialization
    pub random_state: Option<u64>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            impute_missing: false,
            imputation_method: ImputationMethod::Median,
            remove_outliers: false,
            outlier_method: OutlierMethod::Iqr,
            outlier_threshold: 1.5,
            feature_scaling: false,
            scaling_method: ScalingMethod::Standard,
            encode_categorical: false,
            encoding_method: EncodingMethod::Onehot,
            text_processing: false,
            remove_stopwords: false,
            lemmatize: false,
            text_vectorization: VectorizationMethod::Tfidf,
            max_text_features: 100,
            dimensionality_reduction: false,
            reduction_method: ReductionMethod::Pca,
            n_components: 10,
            handle_imbalance: false,
            imbalance_method: ImbalanceMethod::Smote,
            target_column: None,
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            text_columns: Vec::new(),
            datetime_columns: Vec::new(),
            available_columns: Vec::new(),
            random_state: None,
        }
    }
}

impl CleaningConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable imputation
    pub fn with_imputation(mut self, method: ImputationMethod) -> Self {
        self.impute_missing = true;
        self.imputation_method = method;
        self
    }

    /// Builder method to enable outlier removal
    pub fn with_outlier_removal(mut self, method: OutlierMethod, threshold: f64) -> Self {
        self.remove_outliers = true;
        self.outlier_method = method;
        self.outlier_threshold = threshold;
        self
    }

    /// Builder method to enable scaling
    pub fn with_scaling(mut self, method: ScalingMethod) -> Self {
        self.feature_scaling = true;
        self.scaling_method = method;
        self
    }

    /// Builder method to enable categorical encoding
    pub fn with_encoding(mut self, method: EncodingMethod) -> Self {
        self.encode_categorical = true;
        self.encoding_method = method;
        self
    }

    /// Builder method to enable text processing
    pub fn with_text_processing(mut self, remove_stopwords: bool, lemmatize: bool) -> Self {
        self.text_processing = true;
        self.remove_stopwords = remove_stopwords;
        self.lemmatize = lemmatize;
        self
    }

    /// Builder method to enable PCA reduction
    pub fn with_reduction(mut self, n_components: usize) -> Self {
        self.dimensionality_reduction = true;
        self.n_components = n_components;
        self
    }

    /// Builder method to enable imbalance correction on a target column
    pub fn with_imbalance_handling(mut self, target: impl Into<String>) -> Self {
        self.handle_imbalance = true;
        self.target_column = Some(target.into());
        self
    }

    /// Builder method to declare numeric columns
    pub fn with_numeric_columns(mut self, cols: &[&str]) -> Self {
        self.numeric_columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder method to declare categorical columns
    pub fn with_categorical_columns(mut self, cols: &[&str]) -> Self {
        self.categorical_columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder method to declare text columns
    pub fn with_text_columns(mut self, cols: &[&str]) -> Self {
        self.text_columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// All column names this configuration declares, target included.
    pub fn declared_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .numeric_columns
            .iter()
            .chain(&self.categorical_columns)
            .chain(&self.text_columns)
            .chain(&self.datetime_columns)
            .cloned()
            .collect();
        if let Some(target) = &self.target_column {
            cols.push(target.clone());
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.outlier_threshold, 1.5);
        assert_eq!(config.n_components, 10);
        assert_eq!(config.max_text_features, 100);
        assert!(!config.impute_missing);
    }

    #[test]
    fn test_empty_payload_deserializes_with_defaults() {
        let config: CleaningConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.outlier_threshold, 1.5);
        assert!(matches!(config.imputation_method, ImputationMethod::Median));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<CleaningConfig, _> =
            serde_json::from_str(r#"{"impute_missin": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_method_names_are_lowercase() {
        let config: CleaningConfig = serde_json::from_str(
            r#"{"imputation_method": "knn", "outlier_method": "zscore", "scaling_method": "minmax"}"#,
        )
        .unwrap();
        assert!(matches!(config.imputation_method, ImputationMethod::Knn));
        assert!(matches!(config.outlier_method, OutlierMethod::Zscore));
        assert!(matches!(config.scaling_method, ScalingMethod::Minmax));
    }

    #[test]
    fn test_builder_pattern() {
        let config = CleaningConfig::new()
            .with_imputation(ImputationMethod::Knn)
            .with_outlier_removal(OutlierMethod::Iqr, 2.0)
            .with_numeric_columns(&["age", "income"]);

        assert!(config.impute_missing);
        assert!(config.remove_outliers);
        assert_eq!(config.outlier_threshold, 2.0);
        assert_eq!(config.numeric_columns.len(), 2);
    }

    #[test]
    fn test_declared_columns_include_target() {
        let config = CleaningConfig::new()
            .with_numeric_columns(&["a"])
            .with_imbalance_handling("label");
        let declared = config.declared_columns();
        assert!(declared.contains(&"a".to_string()));
        assert!(declared.contains(&"label".to_string()));
    }
}
