use std::collections::{BTreeSet, HashSet};

use log::info;

use crate::classifier::{NaiveBayes, PredictOptions};
use crate::models::{RowKey, Transaction};

/// Split a tag cell on `,` or `;`, dropping blanks.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Category and tag classifiers trained on the user's own ledger.
#[derive(Debug, Clone)]
pub struct Predictor {
    categories: NaiveBayes,
    tags: NaiveBayes,
    tag_options: PredictOptions,
}

impl Predictor {
    pub fn new(tag_confidence: f64, tag_relative_threshold: f64) -> Self {
        Self {
            categories: NaiveBayes::new(),
            tags: NaiveBayes::new(),
            tag_options: PredictOptions::multi(tag_confidence, tag_relative_threshold),
        }
    }

    /// Rebuild both classifiers from scratch from every labelled ledger row.
    pub fn train(&mut self, ledger: &[Transaction]) {
        self.categories = NaiveBayes::new();
        self.tags = NaiveBayes::new();
        for row in ledger {
            let text = row.classification_text();
            if !row.category.is_empty() {
                self.categories.train(&text, &row.category);
            }
            for tag in split_tags(&row.tags) {
                self.tags.train(&text, &tag);
            }
        }
        info!(
            "trained on {} ledger rows: {} category documents, {} tag documents",
            ledger.len(),
            self.categories.document_count(),
            self.tags.document_count()
        );
    }

    pub fn categories(&self) -> &NaiveBayes {
        &self.categories
    }

    pub fn tags(&self) -> &NaiveBayes {
        &self.tags
    }

    pub fn predict_category(&self, text: &str, confidence_level: f64) -> Option<String> {
        self.categories.best(text, confidence_level)
    }

    pub fn predict_tags(&self, text: &str) -> Vec<String> {
        self.tags.predict(text, &self.tag_options)
    }

    /// Fill in an empty category, then empty tags once a category is set.
    /// Returns whether the row changed.
    pub fn predict_row(&self, row: &mut Transaction, category_confidence: f64) -> bool {
        let text = row.classification_text();
        let mut modified = false;

        if row.category.is_empty() {
            if let Some(category) = self.predict_category(&text, category_confidence) {
                row.category = category;
                modified = true;
            }
        }

        if !row.category.is_empty() && row.tags.is_empty() {
            let tags = self.predict_tags(&text);
            if !tags.is_empty() {
                row.tags = tags.join(", ");
                modified = true;
            }
        }

        modified
    }

    /// Predict for every row not in `ignore`; returns the keys of rows that changed.
    pub fn apply_predictions<'a, I>(
        &self,
        rows: I,
        ignore: &HashSet<RowKey>,
        category_confidence: f64,
    ) -> BTreeSet<RowKey>
    where
        I: IntoIterator<Item = &'a mut Transaction>,
    {
        let mut modified = BTreeSet::new();
        for row in rows {
            let key = row.key();
            if ignore.contains(&key) {
                continue;
            }
            if self.predict_row(row, category_confidence) {
                modified.insert(key);
            }
        }
        modified
    }
}
