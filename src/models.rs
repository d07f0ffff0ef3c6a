use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Columns of the ledger sheet, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    PostingDate,
    Sender,
    Recipient,
    PaymentType,
    Text,
    Debit,
    Credit,
    Group,
    Amount,
    Year,
    Month,
    Day,
    Category,
    Tags,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::PostingDate,
        Column::Sender,
        Column::Recipient,
        Column::PaymentType,
        Column::Text,
        Column::Debit,
        Column::Credit,
        Column::Group,
        Column::Amount,
        Column::Year,
        Column::Month,
        Column::Day,
        Column::Category,
        Column::Tags,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::PostingDate => "Bokføringsdato",
            Self::Sender => "Avsender",
            Self::Recipient => "Mottaker",
            Self::PaymentType => "Type",
            Self::Text => "Tekst",
            Self::Debit => "Ut fra konto",
            Self::Credit => "Inn på konto",
            Self::Group => "Gruppe",
            Self::Amount => "Beløp",
            Self::Year => "År",
            Self::Month => "Måned",
            Self::Day => "Dag",
            Self::Category => "Kategori",
            Self::Tags => "Merker",
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Self::ALL.iter().find(|c| c.header() == header).copied()
    }

    /// Columns the exporter must write as numbers rather than strings.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Amount | Self::Debit | Self::Credit | Self::Year | Self::Day
        )
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::PaymentType | Self::Category | Self::Tags)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A typed sheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_str(""),
            Cell::Text(s) => serializer.serialize_str(s),
            // Whole numbers go out as integers so years and days stay `2024`, not `2024.0`.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Cell::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// An untyped import row keyed by whatever headers the source file used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(BTreeMap<String, String>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Field value, or `""` when the field is absent.
    pub fn field(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Stable identity for a row across re-creation: date, amount, sender, recipient.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical ledger row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub posting_date: String,
    pub sender: String,
    pub recipient: String,
    pub payment_type: String,
    pub text: String,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub group: String,
    pub amount: Option<f64>,
    pub year: Option<i64>,
    pub month: String,
    pub day: Option<i64>,
    pub category: String,
    pub tags: String,
}

impl Transaction {
    pub fn cell(&self, column: Column) -> Cell {
        let text = |s: &str| {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.to_string())
            }
        };
        let number = |n: Option<f64>| n.map_or(Cell::Empty, Cell::Number);
        match column {
            Column::PostingDate => text(&self.posting_date),
            Column::Sender => text(&self.sender),
            Column::Recipient => text(&self.recipient),
            Column::PaymentType => text(&self.payment_type),
            Column::Text => text(&self.text),
            Column::Debit => number(self.debit),
            Column::Credit => number(self.credit),
            Column::Group => text(&self.group),
            Column::Amount => number(self.amount),
            Column::Year => number(self.year.map(|y| y as f64)),
            Column::Month => text(&self.month),
            Column::Day => number(self.day.map(|d| d as f64)),
            Column::Category => text(&self.category),
            Column::Tags => text(&self.tags),
        }
    }

    /// Cell rendered as text; empty and missing values both render as `""`.
    pub fn value(&self, column: Column) -> String {
        self.cell(column).to_string()
    }

    /// Mutable access to a free-text column. Numeric and derived columns return `None`.
    pub fn text_mut(&mut self, column: Column) -> Option<&mut String> {
        match column {
            Column::PostingDate => Some(&mut self.posting_date),
            Column::Sender => Some(&mut self.sender),
            Column::Recipient => Some(&mut self.recipient),
            Column::PaymentType => Some(&mut self.payment_type),
            Column::Text => Some(&mut self.text),
            Column::Group => Some(&mut self.group),
            Column::Month => Some(&mut self.month),
            Column::Category => Some(&mut self.category),
            Column::Tags => Some(&mut self.tags),
            Column::Debit | Column::Credit | Column::Amount | Column::Year | Column::Day => None,
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey(format!(
            "{}_{}_{}_{}",
            self.posting_date,
            self.value(Column::Amount),
            self.sender,
            self.recipient
        ))
    }

    /// Text the classifiers are trained and queried on.
    pub fn classification_text(&self) -> String {
        format!("{} {} {}", self.sender, self.recipient, self.text)
    }
}

/// One object per row, keyed by sheet header in sheet order.
impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Column::ALL.len()))?;
        for column in Column::ALL {
            map.serialize_entry(column.header(), &self.cell(column))?;
        }
        map.end()
    }
}
