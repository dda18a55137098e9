//! Parser for Prokka and Bakta annotation summaries (`<name>.txt`).
//!
//! Both are `key: value` text files. Only feature counts on the tool's
//! allow-list are kept, as `annotator_total_<key>` integers.

use anyhow::Context;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{sample_record, ResultParser};
use crate::record::Record;

const PROKKA_KEYS: &[&str] = &["CDS", "rRNA", "tRNA"];

const BAKTA_KEYS: &[&str] = &[
    "tRNAs",
    "tmRNAs",
    "rRNAs",
    "ncRNAs",
    "ncRNA regions",
    "CRISPR arrays",
    "CDSs",
    "pseudogenes",
    "hypotheticals",
    "signal peptides",
    "sORFs",
    "gaps",
    "oriCs",
    "oriVs",
    "oriTs",
];

/// Which annotation tool wrote the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotator {
    Prokka,
    Bakta,
}

impl Annotator {
    /// Detect the tool from its output directory
    pub fn from_path(path: &Path) -> Option<Self> {
        path.components().rev().find_map(|c| match c.as_os_str().to_str() {
            Some("prokka") => Some(Annotator::Prokka),
            Some("bakta") => Some(Annotator::Bakta),
            _ => None,
        })
    }

    fn allowed_keys(&self) -> &'static [&'static str] {
        match self {
            Annotator::Prokka => PROKKA_KEYS,
            Annotator::Bakta => BAKTA_KEYS,
        }
    }
}

pub struct AnnotatorParser;

impl ResultParser for AnnotatorParser {
    fn name(&self) -> &str {
        "annotator"
    }

    fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> {
        let annotator = Annotator::from_path(path)
            .with_context(|| format!("Unknown annotation tool for {}", path.display()))?;
        let allowed = annotator.allowed_keys();

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open annotation summary: {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut record = sample_record(sample);
        for line in reader.lines() {
            let line = line?;
            let Some((key, val)) = line.trim_end().split_once(':') else { continue };
            let key = key.trim();
            if !allowed.contains(&key) {
                continue;
            }

            let count: i64 = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid count for '{}' in {}: '{}'", key, path.display(), val.trim()))?;
            record.insert(
                format!("annotator_total_{}", key.replace(' ', "_")),
                Value::from(count),
            );
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_prokka_summary() {
        let dir = TempDir::new().unwrap();
        let prokka = dir.path().join("prokka");
        std::fs::create_dir(&prokka).unwrap();
        let path = prokka.join("S1.txt");
        std::fs::write(
            &path,
            "organism: Staphylococcus aureus\ncontigs: 42\nbases: 2800000\nCDS: 2650\nrRNA: 6\nrepeat_region: 2\ntRNA: 58\n",
        )
        .unwrap();

        let record = AnnotatorParser.parse(&path, "S1").unwrap();
        let keys: Vec<&str> = record.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["sample", "annotator_total_CDS", "annotator_total_rRNA", "annotator_total_tRNA"]
        );
        assert_eq!(record["annotator_total_CDS"], json!(2650));
    }

    #[test]
    fn test_bakta_summary() {
        let dir = TempDir::new().unwrap();
        let bakta = dir.path().join("bakta");
        std::fs::create_dir(&bakta).unwrap();
        let path = bakta.join("S1.txt");
        std::fs::write(
            &path,
            "Sequence(s):\nLength: 2800000\nCount: 42\n\nAnnotation:\ntRNAs: 58\nrRNAs: 6\nCRISPR arrays: 1\nCDSs: 2600\n",
        )
        .unwrap();

        let record = AnnotatorParser.parse(&path, "S1").unwrap();
        assert_eq!(record["annotator_total_tRNAs"], json!(58));
        assert_eq!(record["annotator_total_CRISPR_arrays"], json!(1));
        assert_eq!(record["annotator_total_CDSs"], json!(2600));
        assert!(!record.contains_key("annotator_total_Length"));
    }

    #[test]
    fn test_non_integer_count_fails() {
        let dir = TempDir::new().unwrap();
        let prokka = dir.path().join("prokka");
        std::fs::create_dir(&prokka).unwrap();
        let path = prokka.join("S1.txt");
        std::fs::write(&path, "CDS: many\n").unwrap();
        assert!(AnnotatorParser.parse(&path, "S1").is_err());
    }

    #[test]
    fn test_annotator_from_path() {
        assert_eq!(
            Annotator::from_path(Path::new("S1/bactopia-main/annotator/bakta/S1.txt")),
            Some(Annotator::Bakta)
        );
        assert_eq!(Annotator::from_path(Path::new("S1/other/S1.txt")), None);
    }
}
