//! Parser for the gather step metadata (`<name>-meta.tsv`).

use std::path::Path;

use super::generic::first_row;
use super::ResultParser;
use crate::record::Record;

pub struct GatherParser;

impl ResultParser for GatherParser {
    fn name(&self) -> &str {
        "gather"
    }

    fn parse(&self, path: &Path, _sample: &str) -> anyhow::Result<Record> {
        first_row(path)
    }
}
