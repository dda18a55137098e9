//! Parser for assembly-scan summary tables (`<name>.tsv`).

use std::path::Path;

use super::generic::first_row;
use super::ResultParser;
use crate::record::{Record, SAMPLE_KEY};

pub struct AssemblerParser;

impl ResultParser for AssemblerParser {
    fn name(&self) -> &str {
        "assembler"
    }

    fn parse(&self, path: &Path, _sample: &str) -> anyhow::Result<Record> {
        let row = first_row(path)?;
        Ok(row
            .into_iter()
            .map(|(key, val)| {
                if key == SAMPLE_KEY {
                    (key, val)
                } else {
                    (format!("assembler_{}", key), val)
                }
            })
            .collect())
    }
}
