use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9_]+").expect("static token pattern"))
}

/// Lowercased runs of ASCII word characters. Everything else, `æøå` included,
/// is a delimiter.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_re()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictOptions {
    /// Required odds ratio between the best and the runner-up label.
    pub confidence_level: f64,
    /// Return every label close to the best one, not only the best.
    pub multi: bool,
    /// In multi mode, how far below the best (as an odds ratio) a label may score.
    pub relative_threshold: f64,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            confidence_level: 2.0,
            multi: false,
            relative_threshold: 2.0,
        }
    }
}

impl PredictOptions {
    pub fn single(confidence_level: f64) -> Self {
        Self {
            confidence_level,
            ..Self::default()
        }
    }

    pub fn multi(confidence_level: f64, relative_threshold: f64) -> Self {
        Self {
            confidence_level,
            multi: true,
            relative_threshold,
        }
    }
}

/// Multinomial Naive Bayes over bag-of-words, with add-one smoothing.
#[derive(Debug, Clone, Default)]
pub struct NaiveBayes {
    label_documents: BTreeMap<String, usize>,
    token_counts: HashMap<String, HashMap<String, usize>>,
    label_tokens: HashMap<String, usize>,
    vocabulary: HashSet<String>,
    total_documents: usize,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn train(&mut self, text: &str, label: &str) {
        self.total_documents += 1;
        *self.label_documents.entry(label.to_string()).or_default() += 1;

        let tokens = tokenize(text);
        *self.label_tokens.entry(label.to_string()).or_default() += tokens.len();
        let counts = self.token_counts.entry(label.to_string()).or_default();
        for token in tokens {
            *counts.entry(token.clone()).or_default() += 1;
            self.vocabulary.insert(token);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_documents == 0
    }

    pub fn document_count(&self) -> usize {
        self.total_documents
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.label_documents.keys().map(String::as_str)
    }

    /// Log-posterior (up to a shared constant) per label, best first.
    /// Equal scores are ordered by label name.
    pub fn scores(&self, text: &str) -> Vec<(String, f64)> {
        let tokens = tokenize(text);
        let total = (self.total_documents as f64).ln();
        let vocab = self.vocabulary.len();

        let mut scores: Vec<(String, f64)> = self
            .label_documents
            .iter()
            .map(|(label, &docs)| {
                let counts = self.token_counts.get(label);
                let label_total = self.label_tokens.get(label).copied().unwrap_or(0);
                let denom = ((label_total + vocab) as f64).ln();
                let likelihood: f64 = tokens
                    .iter()
                    .map(|t| {
                        let n = counts.and_then(|c| c.get(t)).copied().unwrap_or(0);
                        ((n + 1) as f64).ln() - denom
                    })
                    .sum();
                (label.clone(), (docs as f64).ln() - total + likelihood)
            })
            .collect();

        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scores
    }

    /// Labels for `text`, or an empty vec when the model is untrained or not
    /// confident enough. Single mode yields at most one label.
    pub fn predict(&self, text: &str, options: &PredictOptions) -> Vec<String> {
        let mut scores = self.scores(text);
        match scores.len() {
            0 => return Vec::new(),
            1 => return vec![scores.remove(0).0],
            _ => {}
        }

        let best = scores[0].1;
        let second = scores[1].1;
        if best < second + options.confidence_level.ln() {
            return Vec::new();
        }

        if !options.multi {
            return vec![scores.remove(0).0];
        }

        let floor = best - options.relative_threshold.ln();
        scores
            .into_iter()
            .enumerate()
            .filter(|(i, (_, score))| *i == 0 || *score > floor)
            .map(|(_, (label, _))| label)
            .collect()
    }

    pub fn best(&self, text: &str, confidence_level: f64) -> Option<String> {
        self.predict(text, &PredictOptions::single(confidence_level))
            .into_iter()
            .next()
    }
}
