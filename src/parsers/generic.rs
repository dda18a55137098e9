//! Shared readers for delimited, JSON and YAML result files.
//!
//! These return the decoded structure unchanged; callers cast numeric strings
//! themselves.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::record::Record;

fn tsv_reader(path: &Path, has_header: bool) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_header)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))
}

/// Parse a tab-delimited file with a header row into one record per row.
///
/// Short rows are padded with nulls, extra fields are dropped.
pub fn parse_table(path: &Path) -> Result<Vec<Record>> {
    let mut reader = tsv_reader(path, true)?;
    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Failed to parse row {} of {}", i + 1, path.display()))?;
        let record: Record = header
            .iter()
            .enumerate()
            .map(|(j, column)| {
                let val = row
                    .get(j)
                    .map(|v| Value::String(v.to_string()))
                    .unwrap_or(Value::Null);
                (column.clone(), val)
            })
            .collect();
        rows.push(record);
    }
    Ok(rows)
}

/// Parse a tab-delimited file without a header into raw rows
pub fn parse_table_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = tsv_reader(path, false)?;
    let mut rows = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Failed to parse row {} of {}", i + 1, path.display()))?;
        rows.push(row.iter().map(|f| f.to_string()).collect());
    }
    Ok(rows)
}

/// First row of a headed table; an empty table is an error
pub fn first_row(path: &Path) -> Result<Record> {
    parse_table(path)?
        .into_iter()
        .next()
        .with_context(|| format!("No rows found in {}", path.display()))
}

pub fn parse_json(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("Failed to open JSON: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

pub fn parse_yaml(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("Failed to open YAML: {}", path.display()))?;
    serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse YAML: {}", path.display()))
}
