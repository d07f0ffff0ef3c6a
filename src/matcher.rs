use log::{debug, warn};

use crate::error::Error;
use crate::models::{Column, RawRecord, Transaction};
use crate::normalizer::{normalize, RESERVED};

/// Columns two rows must agree on to count as the same transaction.
pub const COMPARE_COLUMNS: [Column; 8] = [
    Column::PostingDate,
    Column::Sender,
    Column::Recipient,
    Column::PaymentType,
    Column::Text,
    Column::Debit,
    Column::Credit,
    Column::Amount,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Every comparison column, posting date included.
    Full,
    /// Every comparison column except the posting date.
    IgnoreDate,
}

impl Comparison {
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        COMPARE_COLUMNS
            .into_iter()
            .filter(move |c| *self == Comparison::Full || *c != Column::PostingDate)
    }

    pub fn equal(&self, a: &Transaction, b: &Transaction) -> bool {
        self.columns().all(|c| a.value(c) == b.value(c))
    }
}

pub fn is_exact(old: &Transaction, new: &Transaction) -> bool {
    Comparison::Full.equal(old, new)
}

/// Same transaction re-posted: either side still pending, or the date moved.
pub fn is_near(old: &Transaction, new: &Transaction) -> bool {
    Comparison::IgnoreDate.equal(old, new)
        && (old.posting_date == RESERVED
            || new.posting_date == RESERVED
            || old.posting_date != new.posting_date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Exact { ledger_index: usize },
    Near { ledger_index: usize },
    New,
}

/// Classify one normalized row against the ledger. First match in ledger order wins.
pub fn match_one(ledger: &[Transaction], incoming: &Transaction) -> MatchOutcome {
    if let Some(i) = ledger.iter().position(|old| is_exact(old, incoming)) {
        return MatchOutcome::Exact { ledger_index: i };
    }
    if let Some(i) = ledger.iter().position(|old| is_near(old, incoming)) {
        return MatchOutcome::Near { ledger_index: i };
    }
    MatchOutcome::New
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPair {
    pub ledger_index: usize,
    pub old: Transaction,
    pub new: Transaction,
}

/// An import row that could not be normalized, with its position in the batch.
#[derive(Debug)]
pub struct SkippedRow {
    pub index: usize,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub exact: Vec<MatchPair>,
    pub near: Vec<MatchPair>,
    pub new: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

/// Normalize a raw batch, setting aside the rows that fail.
pub fn normalize_batch(batch: &[RawRecord]) -> (Vec<Transaction>, Vec<SkippedRow>) {
    let mut rows = Vec::with_capacity(batch.len());
    let mut skipped = Vec::new();
    for (index, raw) in batch.iter().enumerate() {
        if raw.is_blank() {
            continue;
        }
        match normalize(raw) {
            Ok(t) => rows.push(t),
            Err(error) => {
                warn!("skipping import row {}: {error}", index + 1);
                skipped.push(SkippedRow { index, error });
            }
        }
    }
    (rows, skipped)
}

pub fn reconcile(ledger: &[Transaction], batch: &[RawRecord]) -> Reconciliation {
    let (rows, skipped) = normalize_batch(batch);
    let mut result = reconcile_normalized(ledger, &rows);
    result.skipped = skipped;
    result
}

pub fn reconcile_normalized(ledger: &[Transaction], batch: &[Transaction]) -> Reconciliation {
    let mut result = Reconciliation::default();
    for incoming in batch {
        match match_one(ledger, incoming) {
            MatchOutcome::Exact { ledger_index } => result.exact.push(MatchPair {
                ledger_index,
                old: ledger[ledger_index].clone(),
                new: incoming.clone(),
            }),
            MatchOutcome::Near { ledger_index } => result.near.push(MatchPair {
                ledger_index,
                old: ledger[ledger_index].clone(),
                new: incoming.clone(),
            }),
            MatchOutcome::New => result.new.push(incoming.clone()),
        }
    }
    debug!(
        "reconciled {} rows: {} exact, {} near, {} new",
        batch.len(),
        result.exact.len(),
        result.near.len(),
        result.new.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::ImportFormat;

    fn ledger_row(pairs: &[(&str, &str)]) -> Transaction {
        let raw: RawRecord = pairs.iter().copied().collect();
        ImportFormat::Ledger.normalize(&raw).unwrap()
    }

    fn bank_row(date: &str, sender: &str, amount: &str) -> RawRecord {
        [("Bokføringsdato", date), ("Avsender", sender), ("Beløp", amount)]
            .into_iter()
            .collect()
    }

    fn kiwi_ledger() -> Vec<Transaction> {
        vec![ledger_row(&[
            ("Bokføringsdato", "2024/01/10"),
            ("Avsender", "Kiwi"),
            ("Beløp", "-200"),
            ("Kategori", "Mat"),
        ])]
    }

    #[test]
    fn test_end_to_end_exact_duplicate() {
        let result = reconcile(&kiwi_ledger(), &[bank_row("2024/01/10", "Kiwi", "-200")]);
        assert_eq!(result.exact.len(), 1);
        assert!(result.near.is_empty());
        assert!(result.new.is_empty());
        assert_eq!(result.exact[0].ledger_index, 0);
        assert_eq!(result.exact[0].old.category, "Mat");
    }

    #[test]
    fn test_reserved_ledger_row_is_near_match() {
        let ledger = vec![ledger_row(&[
            ("Bokføringsdato", RESERVED),
            ("Avsender", "Kiwi"),
            ("Beløp", "-200"),
        ])];
        let result = reconcile(&ledger, &[bank_row("2024/01/10", "Kiwi", "-200")]);
        assert!(result.exact.is_empty());
        assert_eq!(result.near.len(), 1);
        assert_eq!(result.near[0].old.posting_date, RESERVED);
        assert_eq!(result.near[0].new.posting_date, "2024/01/10");
    }

    #[test]
    fn test_reserved_import_row_is_near_match() {
        let result = reconcile(&kiwi_ledger(), &[bank_row(RESERVED, "Kiwi", "-200")]);
        assert_eq!(result.near.len(), 1);
    }

    #[test]
    fn test_shifted_date_is_near_match() {
        let result = reconcile(&kiwi_ledger(), &[bank_row("2024/01/11", "Kiwi", "-200")]);
        assert_eq!(result.near.len(), 1);
    }

    #[test]
    fn test_different_amount_is_new() {
        let result = reconcile(&kiwi_ledger(), &[bank_row("2024/01/10", "Kiwi", "-201")]);
        assert_eq!(result.new.len(), 1);
        assert!(result.exact.is_empty() && result.near.is_empty());
    }

    #[test]
    fn test_zero_amount_reimport_is_exact() {
        let ledger = vec![ledger_row(&[
            ("Bokføringsdato", "2024/01/10"),
            ("Avsender", "Kiwi"),
            ("Beløp", "0"),
            ("Kategori", "Mat"),
        ])];
        let result = reconcile(&ledger, &[bank_row("2024/01/10", "Kiwi", "0")]);
        assert_eq!(result.exact.len(), 1);
        assert!(result.near.is_empty());
        assert!(result.new.is_empty());
    }

    #[test]
    fn test_exact_wins_over_earlier_near() {
        let ledger = vec![
            ledger_row(&[("Bokføringsdato", RESERVED), ("Avsender", "Kiwi"), ("Beløp", "-200")]),
            ledger_row(&[
                ("Bokføringsdato", "2024/01/10"),
                ("Avsender", "Kiwi"),
                ("Beløp", "-200"),
            ]),
        ];
        let result = reconcile(&ledger, &[bank_row("2024/01/10", "Kiwi", "-200")]);
        assert_eq!(result.exact.len(), 1);
        assert_eq!(result.exact[0].ledger_index, 1);
    }

    #[test]
    fn test_first_near_match_in_ledger_order() {
        let ledger = vec![
            ledger_row(&[
                ("Bokføringsdato", "2024/01/01"),
                ("Avsender", "Kiwi"),
                ("Beløp", "-200"),
            ]),
            ledger_row(&[("Bokføringsdato", RESERVED), ("Avsender", "Kiwi"), ("Beløp", "-200")]),
        ];
        let result = reconcile(&ledger, &[bank_row("2024/01/10", "Kiwi", "-200")]);
        assert_eq!(result.near[0].ledger_index, 0);
    }

    #[test]
    fn test_one_ledger_row_can_match_many_imports() {
        let batch = vec![
            bank_row("2024/01/10", "Kiwi", "-200"),
            bank_row("2024/01/10", "Kiwi", "-200"),
        ];
        let result = reconcile(&kiwi_ledger(), &batch);
        assert_eq!(result.exact.len(), 2);
    }

    #[test]
    fn test_bad_rows_are_skipped_not_fatal() {
        let batch = vec![
            bank_row("2024/01/10", "Kiwi", "oops"),
            bank_row("2024/02/01", "Rema", "-99"),
            [("Foo", "bar")].into_iter().collect(),
        ];
        let result = reconcile(&kiwi_ledger(), &batch);
        assert_eq!(result.new.len(), 1);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].index, 0);
        assert!(matches!(result.skipped[0].error, Error::Format { .. }));
        assert_eq!(result.skipped[1].index, 2);
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let ledger = vec![
            ledger_row(&[("Bokføringsdato", RESERVED), ("Avsender", "Kiwi"), ("Beløp", "-200")]),
            ledger_row(&[
                ("Bokføringsdato", "2024/01/05"),
                ("Avsender", "Ruter"),
                ("Beløp", "-39"),
            ]),
        ];
        let batch = vec![
            bank_row("2024/01/10", "Kiwi", "-200"),
            bank_row("2024/01/05", "Ruter", "-39"),
            bank_row("2024/01/06", "Ruter", "-39"),
            bank_row("2024/01/07", "Vy", "-120"),
        ];
        let a = reconcile(&ledger, &batch);
        let b = reconcile(&ledger, &batch);
        assert_eq!(a.exact, b.exact);
        assert_eq!(a.near, b.near);
        assert_eq!(a.new, b.new);
        assert_eq!((a.exact.len(), a.near.len(), a.new.len()), (1, 2, 1));
    }

    #[test]
    fn test_ledger_not_mutated() {
        let ledger = kiwi_ledger();
        let before = ledger.clone();
        reconcile(&ledger, &[bank_row("2024/01/11", "Kiwi", "-200")]);
        assert_eq!(ledger, before);
    }
}
