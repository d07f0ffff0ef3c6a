use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid number in {column}: {value:?}")]
    Format { column: &'static str, value: String },

    #[error("Unrecognized record layout (headers: {0})")]
    UnmappableRecord(String),

    #[error("Column is not editable: {0}")]
    NotEditable(String),

    #[error("No row with key {0}")]
    UnknownRow(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
