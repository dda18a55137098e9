//! Parser for mlst results.
//!
//! Header-less, one row: filename, PubMLST scheme, sequence type, then allele
//! calls. Only the scheme and ST are kept.

use anyhow::Context;
use serde_json::Value;
use std::path::Path;

use super::generic::parse_table_rows;
use super::{sample_record, ResultParser};
use crate::record::Record;

pub struct MlstParser;

impl ResultParser for MlstParser {
    fn name(&self) -> &str {
        "mlst"
    }

    fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> {
        let row = parse_table_rows(path)?
            .into_iter()
            .next()
            .with_context(|| format!("No rows found in {}", path.display()))?;
        if row.len() < 3 {
            anyhow::bail!(
                "Expected at least 3 columns in {}, found {}",
                path.display(),
                row.len()
            );
        }

        let mut record = sample_record(sample);
        record.insert("mlst_scheme".to_string(), Value::String(row[1].clone()));
        record.insert("mlst_st".to_string(), Value::String(row[2].clone()));
        Ok(record)
    }
}
