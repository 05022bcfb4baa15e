//! FAQ datasets used to seed the retriever.

use std::collections::HashSet;
use std::path::Path;

use rag_core::{FaqEntry, RagError, Result, RetrievalConfig};

/// The built-in machine learning FAQ.
pub fn ml_faq() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            1,
            "What is supervised learning?",
            "Supervised learning maps inputs to labeled outputs using example pairs; common tasks include classification and regression.",
        ),
        FaqEntry::new(
            2,
            "What is unsupervised learning?",
            "Unsupervised learning finds structure in unlabeled data, e.g., clustering and dimensionality reduction.",
        ),
        FaqEntry::new(
            3,
            "What is overfitting?",
            "Overfitting happens when a model memorizes the training data and fails to generalize; use regularization or more data.",
        ),
        FaqEntry::new(
            4,
            "What is a confusion matrix?",
            "A confusion matrix shows counts of true/false positives/negatives for a classifier, helping analyze performance.",
        ),
        FaqEntry::new(
            5,
            "What is cross-validation?",
            "Cross-validation splits data into folds to estimate generalization performance while tuning hyperparameters.",
        ),
    ]
}

/// Load a JSON array of `{id, question, answer}` objects.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<FaqEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        RagError::config(format!("Failed to read dataset {}: {}", path.display(), e))
    })?;

    let entries: Vec<FaqEntry> = serde_json::from_str(&content).map_err(|e| {
        RagError::config(format!("Failed to parse dataset {}: {}", path.display(), e))
    })?;

    Ok(entries)
}

/// Dataset selected by the retrieval configuration.
pub fn dataset_from_config(config: &RetrievalConfig) -> Result<Vec<FaqEntry>> {
    match &config.dataset_path {
        Some(path) => load_dataset(path),
        None => Ok(ml_faq()),
    }
}

/// First id that occurs more than once, if any.
pub(crate) fn duplicate_id(entries: &[FaqEntry]) -> Option<u64> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries.iter().map(|e| e.id).find(|id| !seen.insert(*id))
}
