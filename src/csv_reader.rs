use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::data::Table;

/// Read CSV text from any reader. The first record is the header row.
///
/// Rows shorter than the header are padded with missing values; a source
/// without a header row yields a table with no columns.
pub fn read_csv<R: Read>(input: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Ok(Table::default());
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", idx + 1))?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        // Extra trailing cells beyond the header are dropped.
        row.truncate(headers.len());
        rows.push(row);
    }

    Table::from_text_rows(headers, rows)
}

pub fn read_csv_from_stdin() -> Result<Table> {
    read_csv(io::stdin().lock())
}

pub fn read_csv_from_path(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(file).with_context(|| format!("Failed to parse {}", path.display()))
}
