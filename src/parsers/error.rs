//! Detection of `*-error.txt` markers left by failed pipeline steps.

use serde::{Deserialize, Serialize};
use std::path::Path;

const ERROR_SUFFIX: &str = "-error.txt";

/// Known error types and their descriptions
const ERROR_TYPES: &[(&str, &str)] = &[
    ("assembly", "Assembled size was not withing an acceptable range"),
    ("different-read-count", "Paired-end read count mismatch"),
    ("genome-size", "Poor estimate of genome size"),
    ("low-read-count", "Low number of reads"),
    ("low-sequence-depth", "Low depth of sequencing"),
    (
        "low-basepair-proportion",
        "Paired-end base pair counts are out of acceptable proportions",
    ),
    ("paired-end", "Paired-end reads were not in acceptable format"),
];

const UNDOCUMENTED_ERROR: &str = "Undocumented error, please submit a bug report.";

/// An error marker found for a sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_type: String,
    pub description: String,
}

impl ErrorRecord {
    /// Build a record from a marker file name such as `S1-low-read-count-error.txt`
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(ERROR_SUFFIX)?;
        let error_type = stem.split_once('-').map(|(_, rest)| rest).unwrap_or(stem);
        let description = ERROR_TYPES
            .iter()
            .find(|(known, _)| *known == error_type)
            .map(|(_, description)| *description)
            .unwrap_or(UNDOCUMENTED_ERROR);

        Some(Self {
            error_type: error_type.to_string(),
            description: description.to_string(),
        })
    }
}

/// Recursively scan a sample directory for error markers.
///
/// Unknown error types are still reported, with a generic description.
pub fn parse_errors(path: &Path, sample: &str) -> Vec<ErrorRecord> {
    let mut markers: Vec<String> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(|name| name.to_string()))
        .filter(|name| name.ends_with(ERROR_SUFFIX))
        .collect();
    markers.sort();

    let errors: Vec<ErrorRecord> = markers
        .iter()
        .filter_map(|name| ErrorRecord::from_file_name(name))
        .collect();

    for error in &errors {
        log::debug!("\t{}: found '{}' error marker", sample, error.error_type);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_error_type() {
        let error = ErrorRecord::from_file_name("S1-low-read-count-error.txt").unwrap();
        assert_eq!(error.error_type, "low-read-count");
        assert_eq!(error.description, "Low number of reads");
    }

    #[test]
    fn test_unknown_error_type_is_kept() {
        let error = ErrorRecord::from_file_name("S1-mystery-error.txt").unwrap();
        assert_eq!(error.error_type, "mystery");
        assert_eq!(error.description, UNDOCUMENTED_ERROR);
    }

    #[test]
    fn test_not_a_marker() {
        assert!(ErrorRecord::from_file_name("S1-meta.tsv").is_none());
    }

    #[test]
    fn test_parse_errors_recurses() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("bactopia-main").join("assembler");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("S1-assembly-error.txt"), "too small").unwrap();
        std::fs::write(dir.path().join("S1-genome-size-error.txt"), "").unwrap();
        std::fs::write(dir.path().join("S1-meta.tsv"), "").unwrap();

        let errors = parse_errors(dir.path(), "S1");
        let types: Vec<&str> = errors.iter().map(|e| e.error_type.as_str()).collect();
        assert_eq!(types, vec!["assembly", "genome-size"]);
        assert_eq!(errors[0].description, "Assembled size was not withing an acceptable range");
    }

    #[test]
    fn test_clean_sample_has_no_errors() {
        let dir = TempDir::new().unwrap();
        assert!(parse_errors(dir.path(), "S1").is_empty());
    }
}
