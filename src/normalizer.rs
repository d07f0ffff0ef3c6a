use crate::error::{Error, Result};
use crate::models::{Column, RawRecord, Transaction};

/// Posting-date marker the bank uses for transactions that have not posted yet.
pub const RESERVED: &str = "Reservert";

const NORWEGIAN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Des",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Three-letter Norwegian abbreviation for a month number given as text ("01", "1").
pub fn month_abbr(month: &str) -> &'static str {
    match month.trim().parse::<usize>() {
        Ok(n @ 1..=12) => NORWEGIAN_MONTHS[n - 1],
        _ => "",
    }
}

/// Parse an amount with either a comma or a period as decimal separator.
///
/// Empty input is an empty amount, not an error.
pub fn parse_amount(column: Column, raw: &str) -> Result<Option<f64>> {
    let s = raw.trim().replacen(',', ".", 1);
    if s.is_empty() {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(Error::Format {
            column: column.header(),
            value: raw.to_string(),
        }),
    }
}

/// Split `YYYY/MM/DD` (or `YYYY-MM-DD`) into year, month and day sources.
pub fn split_date(date: &str) -> Option<(&str, &str, &str)> {
    let parts: Vec<&str> = date.split(['/', '-']).collect();
    match parts.as_slice() {
        [y, m, d] => Some((y, m, d)),
        _ => None,
    }
}

fn date_number(part: &str) -> Option<i64> {
    part.trim().parse::<i64>().ok().filter(|n| *n != 0)
}

/// Year, month abbreviation and day derived from a posting date.
fn date_parts(date: &str) -> (Option<i64>, String, Option<i64>) {
    match split_date(date) {
        Some((y, m, d)) => (date_number(y), month_abbr(m).to_string(), date_number(d)),
        None => (None, String::new(), None),
    }
}

/// Debit and credit columns for a signed amount.
fn debit_credit(amount: Option<f64>) -> (Option<f64>, Option<f64>) {
    match amount {
        Some(a) if a < 0.0 => (Some(-a), None),
        Some(a) if a > 0.0 => (None, Some(a)),
        _ => (None, None),
    }
}

// ---------------------------------------------------------------------------
// Import formats
// ---------------------------------------------------------------------------

const BANK_HEADERS: &[&str] = &[
    "Bokføringsdato",
    "Avsender",
    "Mottaker",
    "Beløp",
    "Tittel",
    "Betalingstype",
];

const LEDGER_ONLY_HEADERS: &[Column] = &[
    Column::PaymentType,
    Column::Text,
    Column::Debit,
    Column::Credit,
    Column::Category,
    Column::Tags,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Bank CSV export: `Bokføringsdato;Avsender;Mottaker;Beløp;Tittel;Betalingstype`.
    BankExport,
    /// A row already in ledger shape, using the canonical column headers.
    Ledger,
}

impl ImportFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::BankExport => "bank_export",
            Self::Ledger => "ledger",
        }
    }

    pub fn detect(raw: &RawRecord) -> Option<ImportFormat> {
        if LEDGER_ONLY_HEADERS.iter().any(|c| raw.has(c.header())) {
            Some(Self::Ledger)
        } else if BANK_HEADERS.iter().any(|h| raw.has(h)) {
            Some(Self::BankExport)
        } else {
            None
        }
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<Transaction> {
        match self {
            Self::BankExport => normalize_bank_export(raw),
            Self::Ledger => normalize_ledger(raw),
        }
    }
}

/// Map an import row of any known layout to the canonical schema.
pub fn normalize(raw: &RawRecord) -> Result<Transaction> {
    let format = ImportFormat::detect(raw).ok_or_else(|| {
        Error::UnmappableRecord(raw.headers().collect::<Vec<_>>().join(", "))
    })?;
    format.normalize(raw)
}

fn normalize_bank_export(raw: &RawRecord) -> Result<Transaction> {
    let posting_date = raw.field("Bokføringsdato").to_string();
    // Zero collapses to an empty amount, same as a missing one.
    let amount = parse_amount(Column::Amount, raw.field("Beløp"))?.filter(|a| *a != 0.0);
    let (debit, credit) = debit_credit(amount);
    let (year, month, day) = date_parts(&posting_date);

    Ok(Transaction {
        sender: raw.field("Avsender").to_string(),
        recipient: raw.field("Mottaker").to_string(),
        payment_type: raw.field("Betalingstype").to_string(),
        text: raw.field("Tittel").to_string(),
        debit,
        credit,
        group: String::new(),
        amount,
        year,
        month,
        day,
        category: String::new(),
        tags: String::new(),
        posting_date,
    })
}

fn normalize_ledger(raw: &RawRecord) -> Result<Transaction> {
    let text = |c: Column| raw.field(c.header()).trim().to_string();
    let number = |c: Column| parse_amount(c, raw.field(c.header()));
    // Zero money columns read as empty, same as on the bank side.
    let money = |c: Column| number(c).map(|v| v.filter(|a| *a != 0.0));

    let posting_date = text(Column::PostingDate);
    let amount = money(Column::Amount)?;
    let mut debit = money(Column::Debit)?;
    let mut credit = money(Column::Credit)?;
    if debit.is_none() && credit.is_none() {
        (debit, credit) = debit_credit(amount);
    }

    let mut year = number(Column::Year)?.map(|y| y as i64);
    let mut month = text(Column::Month);
    let mut day = number(Column::Day)?.map(|d| d as i64);
    if year.is_none() && month.is_empty() && day.is_none() {
        (year, month, day) = date_parts(&posting_date);
    }

    Ok(Transaction {
        sender: text(Column::Sender),
        recipient: text(Column::Recipient),
        payment_type: text(Column::PaymentType),
        text: text(Column::Text),
        debit,
        credit,
        group: text(Column::Group),
        amount,
        year,
        month,
        day,
        category: text(Column::Category),
        tags: text(Column::Tags),
        posting_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::COMPARE_COLUMNS;

    fn bank_row(date: &str, sender: &str, amount: &str) -> RawRecord {
        [
            ("Bokføringsdato", date),
            ("Avsender", sender),
            ("Mottaker", "Meg"),
            ("Beløp", amount),
            ("Tittel", "Varekjøp"),
            ("Betalingstype", "Varer"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_month_abbr() {
        assert_eq!(month_abbr("01"), "Jan");
        assert_eq!(month_abbr("5"), "Mai");
        assert_eq!(month_abbr("12"), "Des");
        assert_eq!(month_abbr("0"), "");
        assert_eq!(month_abbr("13"), "");
        assert_eq!(month_abbr("xx"), "");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Column::Amount, "-200").unwrap(), Some(-200.0));
        assert_eq!(parse_amount(Column::Amount, "-200,50").unwrap(), Some(-200.5));
        assert_eq!(parse_amount(Column::Amount, " 15.25 ").unwrap(), Some(15.25));
        assert_eq!(parse_amount(Column::Amount, "").unwrap(), None);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount(Column::Amount, "abc"),
            Err(Error::Format { column: "Beløp", .. })
        ));
        assert!(parse_amount(Column::Amount, "inf").is_err());
        assert!(parse_amount(Column::Amount, "NaN").is_err());
        assert!(parse_amount(Column::Amount, "1 234,50").is_err());
    }

    #[test]
    fn test_split_date() {
        assert_eq!(split_date("2024/01/10"), Some(("2024", "01", "10")));
        assert_eq!(split_date("2024-01-10"), Some(("2024", "01", "10")));
        assert_eq!(split_date(RESERVED), None);
        assert_eq!(split_date("2024/01"), None);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ImportFormat::detect(&bank_row("2024/01/10", "Kiwi", "-200")),
            Some(ImportFormat::BankExport)
        );
        let ledger: RawRecord = [("Bokføringsdato", "2024/01/10"), ("Kategori", "Mat")]
            .into_iter()
            .collect();
        assert_eq!(ImportFormat::detect(&ledger), Some(ImportFormat::Ledger));
        let junk: RawRecord = [("Foo", "bar")].into_iter().collect();
        assert_eq!(ImportFormat::detect(&junk), None);
        assert!(matches!(normalize(&junk), Err(Error::UnmappableRecord(_))));
    }

    #[test]
    fn test_normalize_outgoing() {
        let t = normalize(&bank_row("2024/03/05", "Kiwi", "-200,50")).unwrap();
        assert_eq!(t.posting_date, "2024/03/05");
        assert_eq!(t.amount, Some(-200.5));
        assert_eq!(t.debit, Some(200.5));
        assert_eq!(t.credit, None);
        assert_eq!(t.year, Some(2024));
        assert_eq!(t.month, "Mar");
        assert_eq!(t.day, Some(5));
        assert_eq!(t.text, "Varekjøp");
        assert_eq!(t.payment_type, "Varer");
        assert!(t.category.is_empty());
        assert!(t.tags.is_empty());
    }

    #[test]
    fn test_normalize_incoming() {
        let t = normalize(&bank_row("2024/03/05", "Arbeidsgiver", "35000")).unwrap();
        assert_eq!(t.debit, None);
        assert_eq!(t.credit, Some(35000.0));
    }

    #[test]
    fn test_normalize_reserved_date_has_no_parts() {
        let t = normalize(&bank_row(RESERVED, "Kiwi", "-200")).unwrap();
        assert_eq!(t.posting_date, RESERVED);
        assert_eq!(t.year, None);
        assert_eq!(t.month, "");
        assert_eq!(t.day, None);
    }

    #[test]
    fn test_normalize_zero_and_missing_amount_are_empty() {
        let zero = normalize(&bank_row("2024/01/10", "Kiwi", "0")).unwrap();
        assert_eq!(zero.amount, None);
        assert_eq!((zero.debit, zero.credit), (None, None));

        let missing: RawRecord = [("Bokføringsdato", "2024/01/10"), ("Avsender", "Kiwi")]
            .into_iter()
            .collect();
        let t = normalize(&missing).unwrap();
        assert_eq!(t.amount, None);
        assert_eq!(t.recipient, "");
    }

    #[test]
    fn test_normalize_bad_amount_is_format_error() {
        let err = normalize(&bank_row("2024/01/10", "Kiwi", "tohundre")).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_ledger_row_derives_missing_columns() {
        let raw: RawRecord = [
            ("Bokføringsdato", "2024/01/10"),
            ("Avsender", "Kiwi"),
            ("Beløp", "-200"),
            ("Kategori", "Mat"),
        ]
        .into_iter()
        .collect();
        let t = ImportFormat::Ledger.normalize(&raw).unwrap();
        assert_eq!(t.debit, Some(200.0));
        assert_eq!(t.month, "Jan");
        assert_eq!(t.category, "Mat");
    }

    #[test]
    fn test_ledger_row_zero_money_columns_are_empty() {
        let raw: RawRecord = [
            ("Bokføringsdato", "2024/01/10"),
            ("Avsender", "Kiwi"),
            ("Ut fra konto", "0"),
            ("Beløp", "0,00"),
            ("Kategori", "Mat"),
        ]
        .into_iter()
        .collect();
        let t = ImportFormat::Ledger.normalize(&raw).unwrap();
        assert_eq!(t.amount, None);
        assert_eq!((t.debit, t.credit), (None, None));
        assert_eq!(t.value(Column::Amount), "");
    }

    #[test]
    fn test_ledger_row_reports_bad_debit_column() {
        let raw: RawRecord = [("Ut fra konto", "mye")].into_iter().collect();
        assert!(matches!(
            ImportFormat::Ledger.normalize(&raw),
            Err(Error::Format { column: "Ut fra konto", .. })
        ));
    }

    #[test]
    fn test_normalize_is_idempotent_on_comparison_fields() {
        let first = normalize(&bank_row("2024/01/10", "Kiwi", "-200")).unwrap();
        let canonical: RawRecord = Column::ALL
            .iter()
            .map(|c| (c.header(), first.value(*c)))
            .collect();
        let second = normalize(&canonical).unwrap();
        for col in COMPARE_COLUMNS {
            assert_eq!(first.value(col), second.value(col), "{col}");
        }
    }
}
