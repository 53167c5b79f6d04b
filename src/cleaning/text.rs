//! Text cleanup and vectorization

use super::config::CleaningConfig;
use super::report::CleaningReport;
use crate::error::{CleanError, Result};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Fixed English stop-word list applied when `remove_stopwords` is set.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such",
    "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "should", "now",
];

/// Rule-based light stemmer: suffix stripping in fixed priority order.
/// An approximation, not a dictionary-based lemmatizer.
fn stem(word: &str) -> &str {
    if let Some(base) = word.strip_suffix("ing") {
        base
    } else if let Some(base) = word.strip_suffix("ly") {
        base
    } else if let Some(base) = word.strip_suffix("ed") {
        base
    } else if let Some(base) = word.strip_suffix("es") {
        base
    } else if let Some(base) = word.strip_suffix('s') {
        base
    } else {
        word
    }
}

/// Normalizes free text: lowercase, alphanumeric-and-space only, optional
/// stop-word removal and stemming.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    remove_stopwords: bool,
    stem_words: bool,
}

impl TextCleaner {
    pub fn new(remove_stopwords: bool, stem_words: bool) -> Self {
        Self {
            remove_stopwords,
            stem_words,
        }
    }

    /// Clean one value into normalized token text.
    pub fn clean(&self, text: &str) -> String {
        let lowered: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect();

        lowered
            .split_whitespace()
            .filter(|word| !self.remove_stopwords || !STOP_WORDS.contains(word))
            .map(|word| {
                if self.stem_words {
                    stem(word).to_string()
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Term-frequency / inverse-document-frequency vectorizer over a single
/// column's vocabulary, capped at a fixed number of features.
///
/// Selected terms are ordered lexicographically so generated column indices
/// are stable across runs.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Number of selected vocabulary terms
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learn the capped vocabulary and inverse document frequencies.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            let unique: BTreeSet<&str> = doc.split_whitespace().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Keep the most document-frequent terms, then index alphabetically.
        let mut ranked: Vec<(&str, usize)> = doc_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = documents.len() as f64;
        self.vocabulary.clear();
        self.idf.clear();
        for (idx, (term, df)) in ranked.into_iter().enumerate() {
            self.vocabulary.insert(term.to_string(), idx);
            self.idf.push(((n_docs + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
        }

        Ok(())
    }

    /// Weigh each document into a fixed-width feature row, l2-normalized.
    pub fn transform(&self, documents: &[String]) -> Result<Vec<Vec<f64>>> {
        if self.vocabulary.is_empty() {
            return Err(CleanError::Unexpected(
                "tfidf vectorizer has an empty vocabulary".to_string(),
            ));
        }

        let n_features = self.vocabulary.len();
        let mut rows = Vec::with_capacity(documents.len());

        for doc in documents {
            let mut row = vec![0.0f64; n_features];
            for term in doc.split_whitespace() {
                if let Some(&idx) = self.vocabulary.get(term) {
                    row[idx] += 1.0;
                }
            }
            for (idx, value) in row.iter_mut().enumerate() {
                *value *= self.idf[idx];
            }
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for value in &mut row {
                    *value /= norm;
                }
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<Vec<f64>>> {
        self.fit(documents)?;
        self.transform(documents)
    }
}

/// Pipeline stage: clean each declared text column and replace it with its
/// TF-IDF feature columns, named `<column>_tfidf_<index>`.
pub fn process_text(
    df: &DataFrame,
    config: &CleaningConfig,
    report: &mut CleaningReport,
) -> Result<DataFrame> {
    let present: Vec<String> = config
        .text_columns
        .iter()
        .filter(|c| df.column(c.as_str()).is_ok())
        .cloned()
        .collect();

    if present.is_empty() {
        return Ok(df.clone());
    }

    let cleaner = TextCleaner::new(config.remove_stopwords, config.lemmatize);
    let mut result = df.clone();

    for name in &present {
        let series = result.column(name.as_str())?.as_materialized_series().clone();
        let ca = series.str().map_err(|e| CleanError::Column {
            column: name.clone(),
            reason: e.to_string(),
        })?;

        let documents: Vec<String> = ca
            .into_iter()
            .map(|opt| cleaner.clean(opt.unwrap_or("")))
            .collect();

        let mut vectorizer = TfidfVectorizer::new(config.max_text_features);
        vectorizer.fit(&documents)?;

        if vectorizer.n_features() == 0 {
            let reason = format!("text column '{name}' has an empty vocabulary; column dropped");
            warn!(%reason, "text vectorization skipped");
            report.record_fallback("text", reason);
            result = result.drop(name.as_str())?;
            continue;
        }

        let rows = vectorizer.transform(&documents)?;
        let n_features = vectorizer.n_features();

        let mut feature_columns = Vec::with_capacity(n_features);
        for idx in 0..n_features {
            let col_name = format!("{name}_tfidf_{idx}");
            let values: Vec<f64> = rows.iter().map(|row| row[idx]).collect();
            feature_columns.push(Column::new(col_name.as_str().into(), values));
            report.columns_encoded.push(col_name);
        }

        result = result.drop(name.as_str())?;
        result = result.hstack(&feature_columns)?;
        debug!(column = %name, features = n_features, "text column vectorized");
    }

    report.columns_processed += present.len();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_special_characters() {
        let cleaner = TextCleaner::new(false, false);
        assert_eq!(cleaner.clean("Great!!! Product #1"), "great product 1");
    }

    #[test]
    fn test_stop_word_removal() {
        let cleaner = TextCleaner::new(true, false);
        assert_eq!(cleaner.clean("this is the best product"), "best product");
    }

    #[test]
    fn test_stemmer_priority_order() {
        // -ing beats -s even when both could match
        assert_eq!(stem("running"), "runn");
        assert_eq!(stem("quickly"), "quick");
        assert_eq!(stem("jumped"), "jump");
        assert_eq!(stem("boxes"), "box");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("box"), "box");
    }

    #[test]
    fn test_tfidf_fixed_width() {
        let docs = vec![
            "great product".to_string(),
            "bad product".to_string(),
            "great service".to_string(),
        ];
        let mut vectorizer = TfidfVectorizer::new(100);
        let rows = vectorizer.fit_transform(&docs).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), vectorizer.n_features());
        // l2 norm of a non-empty row is 1
        let norm: f64 = rows[0].iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_tfidf_max_features_cap() {
        let docs = vec!["a b c d e f g h".to_string(), "a b c d".to_string()];
        let mut vectorizer = TfidfVectorizer::new(3);
        vectorizer.fit(&docs).unwrap();
        assert_eq!(vectorizer.n_features(), 3);
    }

    #[test]
    fn test_stage_replaces_text_column() {
        let df = DataFrame::new(vec![Column::new(
            "review".into(),
            &["Great product", "ok", "bad product"],
        )])
        .unwrap();
        let config = CleaningConfig::new()
            .with_text_processing(false, false)
            .with_text_columns(&["review"]);
        let mut report = CleaningReport::new();

        let result = process_text(&df, &config, &mut report).unwrap();

        assert!(result.column("review").is_err());
        assert!(result
            .get_column_names()
            .iter()
            .all(|n| n.starts_with("review_tfidf_")));
        assert!(report
            .columns_encoded
            .iter()
            .any(|c| c == "review_tfidf_0"));
    }

    #[test]
    fn test_stage_empty_vocabulary_records_fallback() {
        let df = DataFrame::new(vec![Column::new("t".into(), &["", "", ""])]).unwrap();
        let config = CleaningConfig::new()
            .with_text_processing(false, false)
            .with_text_columns(&["t"]);
        let mut report = CleaningReport::new();

        let result = process_text(&df, &config, &mut report).unwrap();
        assert!(result.column("t").is_err());
        assert_eq!(report.fallbacks.len(), 1);
    }
}
