//! Tabular parsing of uploaded register files.
//!
//! Every cell is a string; a missing value is the empty string, never a
//! null. Anything that cannot be read as a rectangular CSV table (invalid
//! UTF-8, ragged rows, an empty file) is malformed input, which the
//! orchestrator records as its own terminal state.

use csv::ReaderBuilder;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("not parseable as CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file contains no header row")]
    Empty,
}

/// An uploaded file parsed into a header row plus string-typed records.
#[derive(Debug, Clone)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn parse(bytes: &[u8]) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new().flexible(false).from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        if headers.is_empty() {
            return Err(TableError::Empty);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data records; the header row is not a record.
    pub fn record_count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value, or the empty string when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}
