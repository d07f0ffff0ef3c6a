use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::matcher::{match_one, normalize_batch, MatchOutcome, SkippedRow};
use crate::models::{Column, RawRecord, RowKey, Transaction};
use crate::normalizer::ImportFormat;
use crate::predictor::Predictor;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// `YYYY/MM/DD` or `YYYY-MM-DD`; the pending marker and anything else is `None`.
pub fn parse_posting_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

/// Oldest first; rows without a usable date sort last.
pub fn by_posting_date(a: &Transaction, b: &Transaction) -> Ordering {
    match (parse_posting_date(&a.posting_date), parse_posting_date(&b.posting_date)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Review and merge results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewKind {
    Exact { ledger_index: usize },
    Near { ledger_index: usize, old: Transaction },
    New,
}

#[derive(Debug, Clone)]
pub struct ReviewEntry {
    pub key: RowKey,
    pub kind: ReviewKind,
    pub row: Transaction,
    /// Category or tags were filled in by the classifiers.
    pub predicted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Review {
    pub entries: Vec<ReviewEntry>,
    pub skipped: usize,
}

impl Review {
    pub fn exact_count(&self) -> usize {
        self.count(|k| matches!(k, ReviewKind::Exact { .. }))
    }

    pub fn near_count(&self) -> usize {
        self.count(|k| matches!(k, ReviewKind::Near { .. }))
    }

    pub fn new_count(&self) -> usize {
        self.count(|k| matches!(k, ReviewKind::New))
    }

    fn count(&self, f: impl Fn(&ReviewKind) -> bool) -> usize {
        self.entries.iter().filter(|e| f(&e.kind)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Appended,
    Replaced { ledger_index: usize },
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub appended: usize,
    pub replaced: usize,
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

fn apply_edits(edits: &HashMap<RowKey, BTreeMap<Column, String>>, row: &mut Transaction) {
    if let Some(changes) = edits.get(&row.key()) {
        for (column, value) in changes {
            if let Some(field) = row.text_mut(*column) {
                field.clone_from(value);
            }
        }
    }
}

/// One reconciliation run: the ledger, the pending import and every decision made on them.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    ledger: Vec<Transaction>,
    pending: Vec<Transaction>,
    skipped: Vec<SkippedRow>,
    ignored: HashSet<RowKey>,
    edits: HashMap<RowKey, BTreeMap<Column, String>>,
    predicted: BTreeSet<RowKey>,
    predictor: Predictor,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let predictor = Predictor::new(settings.tag_confidence, settings.tag_relative_threshold);
        Self {
            settings,
            ledger: Vec::new(),
            pending: Vec::new(),
            skipped: Vec::new(),
            ignored: HashSet::new(),
            edits: HashMap::new(),
            predicted: BTreeSet::new(),
            predictor,
        }
    }

    /// Drop all state except the settings.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ledger(&self) -> &[Transaction] {
        &self.ledger
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn is_predicted(&self, key: &RowKey) -> bool {
        self.predicted.contains(key)
    }

    /// The ledger with every accepted row merged in, ready for export.
    pub fn merged(&self) -> &[Transaction] {
        &self.ledger
    }

    /// Replace the ledger and retrain. Rows that fail to parse are returned, not loaded.
    pub fn load_ledger(&mut self, rows: &[RawRecord]) -> Vec<SkippedRow> {
        let mut ledger = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();
        for (index, raw) in rows.iter().enumerate() {
            if raw.is_blank() {
                continue;
            }
            match ImportFormat::Ledger.normalize(raw) {
                Ok(t) => ledger.push(t),
                Err(error) => {
                    warn!("skipping ledger row {}: {error}", index + 1);
                    skipped.push(SkippedRow { index, error });
                }
            }
        }
        info!("loaded ledger with {} rows", ledger.len());
        self.ledger = ledger;
        self.retrain();
        skipped
    }

    /// Replace the pending import batch.
    pub fn load_import(&mut self, rows: &[RawRecord]) -> &[SkippedRow] {
        let (pending, skipped) = normalize_batch(rows);
        info!(
            "loaded import with {} rows ({} skipped)",
            pending.len(),
            skipped.len()
        );
        self.pending = pending;
        self.skipped = skipped;
        self.predicted.clear();
        &self.skipped
    }

    /// Match the pending rows against the ledger and fill in suggestions for
    /// the rows that would be merged.
    pub fn review(&mut self) -> Review {
        for row in &mut self.pending {
            apply_edits(&self.edits, row);
        }

        let outcomes: Vec<MatchOutcome> = self
            .pending
            .iter()
            .map(|row| match_one(&self.ledger, row))
            .collect();

        let candidates = self
            .pending
            .iter_mut()
            .zip(&outcomes)
            .filter(|(_, o)| !matches!(o, MatchOutcome::Exact { .. }))
            .map(|(row, _)| row);
        let predicted = self.predictor.apply_predictions(
            candidates,
            &self.ignored,
            self.settings.category_confidence,
        );
        debug!("predicted labels for {} pending rows", predicted.len());
        self.predicted.extend(predicted);

        let mut entries: Vec<ReviewEntry> = self
            .pending
            .iter()
            .zip(outcomes)
            .map(|(row, outcome)| {
                let kind = match outcome {
                    MatchOutcome::Exact { ledger_index } => ReviewKind::Exact { ledger_index },
                    MatchOutcome::Near { ledger_index } => ReviewKind::Near {
                        ledger_index,
                        old: self.ledger[ledger_index].clone(),
                    },
                    MatchOutcome::New => ReviewKind::New,
                };
                let key = row.key();
                ReviewEntry {
                    predicted: self.predicted.contains(&key),
                    key,
                    kind,
                    row: row.clone(),
                }
            })
            .collect();
        entries.sort_by(|a, b| by_posting_date(&a.row, &b.row));

        Review {
            entries,
            skipped: self.skipped.len(),
        }
    }

    fn pending_index(&self, key: &RowKey) -> Result<usize> {
        self.pending
            .iter()
            .position(|row| row.key() == *key)
            .ok_or_else(|| Error::UnknownRow(key.to_string()))
    }

    fn merge_pending(&mut self, index: usize) -> Merge {
        let mut row = self.pending.remove(index);
        apply_edits(&self.edits, &mut row);
        let key = row.key();
        self.edits.remove(&key);
        self.predicted.remove(&key);

        match match_one(&self.ledger, &row) {
            MatchOutcome::Exact { .. } => Merge::Duplicate,
            MatchOutcome::Near { ledger_index } => {
                let old = &self.ledger[ledger_index];
                // Labels on the ledger row survive a re-post that has none.
                if row.category.is_empty() {
                    row.category.clone_from(&old.category);
                }
                if row.tags.is_empty() {
                    row.tags.clone_from(&old.tags);
                }
                if row.group.is_empty() {
                    row.group.clone_from(&old.group);
                }
                self.ledger[ledger_index] = row;
                Merge::Replaced { ledger_index }
            }
            MatchOutcome::New => {
                self.ledger.push(row);
                Merge::Appended
            }
        }
    }

    /// Merge one pending row: append it, replace its near match, or drop it as a duplicate.
    pub fn accept(&mut self, key: &RowKey) -> Result<Merge> {
        let index = self.pending_index(key)?;
        let merge = self.merge_pending(index);
        debug!("accepted {key}: {merge:?}");
        self.retrain();
        Ok(merge)
    }

    pub fn accept_all(&mut self) -> MergeSummary {
        let mut summary = MergeSummary::default();
        while !self.pending.is_empty() {
            match self.merge_pending(0) {
                Merge::Appended => summary.appended += 1,
                Merge::Replaced { .. } => summary.replaced += 1,
                Merge::Duplicate => summary.duplicates += 1,
            }
        }
        info!(
            "merged import: {} appended, {} replaced, {} duplicates",
            summary.appended, summary.replaced, summary.duplicates
        );
        self.retrain();
        summary
    }

    pub fn decline(&mut self, key: &RowKey) -> Result<Transaction> {
        let index = self.pending_index(key)?;
        self.edits.remove(key);
        self.predicted.remove(key);
        Ok(self.pending.remove(index))
    }

    /// Set an editable column on every pending or ledger row with `key`.
    /// The edit is remembered and re-applied if the import is loaded again.
    pub fn edit(&mut self, key: &RowKey, column: Column, value: &str) -> Result<()> {
        if !column.is_editable() {
            return Err(Error::NotEditable(column.header().to_string()));
        }
        let value = value.trim();

        let mut found = false;
        for row in self.pending.iter_mut().filter(|r| r.key() == *key) {
            if let Some(field) = row.text_mut(column) {
                *field = value.to_string();
            }
            found = true;
        }
        let mut ledger_changed = false;
        for row in self.ledger.iter_mut().filter(|r| r.key() == *key) {
            if let Some(field) = row.text_mut(column) {
                *field = value.to_string();
            }
            ledger_changed = true;
        }
        if !found && !ledger_changed {
            return Err(Error::UnknownRow(key.to_string()));
        }

        self.edits
            .entry(key.clone())
            .or_default()
            .insert(column, value.to_string());
        if matches!(column, Column::Category | Column::Tags) {
            self.predicted.remove(key);
            if ledger_changed {
                self.retrain();
            }
        }
        Ok(())
    }

    /// Undo a suggestion and keep the row out of future predictions this session.
    pub fn revert_prediction(&mut self, key: &RowKey) -> Result<()> {
        let mut found = false;
        for row in self.pending.iter_mut().filter(|r| r.key() == *key) {
            row.category.clear();
            row.tags.clear();
            found = true;
        }
        let mut ledger_changed = false;
        for row in self.ledger.iter_mut().filter(|r| r.key() == *key) {
            row.category.clear();
            row.tags.clear();
            ledger_changed = true;
        }
        if !found && !ledger_changed {
            return Err(Error::UnknownRow(key.to_string()));
        }

        if let Some(changes) = self.edits.get_mut(key) {
            changes.remove(&Column::Category);
            changes.remove(&Column::Tags);
        }
        self.ignored.insert(key.clone());
        self.predicted.remove(key);
        if ledger_changed {
            self.retrain();
        }
        Ok(())
    }

    /// Suggest labels for unlabelled ledger rows at the strict confidence level.
    pub fn suggest_ledger(&mut self) -> BTreeSet<RowKey> {
        self.retrain();
        let modified = self.predictor.apply_predictions(
            self.ledger.iter_mut(),
            &self.ignored,
            self.settings.strict_category_confidence,
        );
        self.predicted.extend(modified.iter().cloned());
        modified
    }

    fn retrain(&mut self) {
        self.predictor.train(&self.ledger);
    }
}
