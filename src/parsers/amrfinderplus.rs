//! Parser for AMRFinderPlus hit tables.
//!
//! The whole table is kept as one nested value; it is too wide to flatten and
//! is dropped from the final report.

use serde_json::Value;
use std::path::Path;

use super::generic::parse_table;
use super::{sample_record, ResultParser};
use crate::record::Record;

pub struct AmrFinderPlusParser;

/// Column name for the hits, based on which AMRFinderPlus run produced the file
pub fn hits_column(path: &Path) -> &'static str {
    let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or_default();
    if file_name.ends_with("-genes.tsv") {
        "amrfinderplus_genes_hits"
    } else if file_name.ends_with("-proteins.tsv") {
        "amrfinderplus_proteins_hits"
    } else {
        "amrfinderplus_hits"
    }
}

impl ResultParser for AmrFinderPlusParser {
    fn name(&self) -> &str {
        "amrfinderplus"
    }

    fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> {
        let hits: Vec<Value> = parse_table(path)?
            .into_iter()
            .map(|row| Value::Object(row.into_iter().collect()))
            .collect();

        let mut record = sample_record(sample);
        record.insert(hits_column(path).to_string(), Value::Array(hits));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hits_are_nested_by_variant() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("S1-proteins.tsv");
        std::fs::write(
            &path,
            "Protein identifier\tGene symbol\tClass\nP1\tblaZ\tBETA-LACTAM\nP2\tmecA\tBETA-LACTAM\n",
        )
        .unwrap();

        let record = AmrFinderPlusParser.parse(&path, "S1").unwrap();
        let hits = record["amrfinderplus_proteins_hits"].as_array().unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1]["Gene symbol"], "mecA");
    }

    #[test]
    fn test_hits_column() {
        assert_eq!(hits_column(Path::new("x/S1-genes.tsv")), "amrfinderplus_genes_hits");
        assert_eq!(hits_column(Path::new("x/S1-proteins.tsv")), "amrfinderplus_proteins_hits");
        assert_eq!(hits_column(Path::new("x/S1.tsv")), "amrfinderplus_hits");
    }
}
