use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::RawRecord;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pick `;`, `\t` or `,` from whichever is most common in the header line.
fn sniff_delimiter(header_line: &str) -> u8 {
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|d| header_line.bytes().filter(|b| b == d).count())
        .filter(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

/// Excel serial day number to `YYYY/MM/DD`.
pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))?;
    Some(date.format("%Y/%m/%d").to_string())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn parse_csv<R: Read>(mut reader: R) -> Result<Vec<RawRecord>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(content.lines().next().unwrap_or(""));

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

pub fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path)?;
    parse_csv(std::io::BufReader::new(file))
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// First sheet of a workbook, one record per row keyed by the header row.
#[cfg(feature = "xlsx")]
pub fn read_xlsx(path: &Path) -> Result<Vec<RawRecord>> {
    use calamine::{Data, Reader};

    use crate::models::Column;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();
    let date_header = Column::PostingDate.header();

    let mut rows = Vec::new();
    for cells in rows_iter {
        let mut row = RawRecord::new();
        for (header, cell) in headers.iter().zip(cells) {
            if header.is_empty() {
                continue;
            }
            let value = match cell {
                Data::Float(f) if header == date_header => {
                    excel_serial_to_date(*f).unwrap_or_else(|| cell_text(cell))
                }
                Data::Int(i) if header == date_header => {
                    excel_serial_to_date(*i as f64).unwrap_or_else(|| cell_text(cell))
                }
                Data::DateTime(dt) if header == date_header => excel_serial_to_date(dt.as_f64())
                    .unwrap_or_else(|| cell_text(cell)),
                _ => cell_text(cell),
            };
            row.insert(header.clone(), value);
        }
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Read a CSV or XLSX file by extension.
pub fn read_rows(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => read_csv(path),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xls" | "ods" => read_xlsx(path),
        _ => Err(Error::UnknownFormat(ext)),
    }
}
