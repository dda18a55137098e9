//! Parser for the `versions.yml` files each pipeline process writes.
//!
//! ```yaml
//! ASSEMBLER:
//!   shovill: 1.1.0
//!   assembly-scan: 1.0.0
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::generic::parse_yaml;
use crate::record::render_field;

/// A single tool version reported by one process for one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolVersion {
    pub sample: String,
    pub process: String,
    pub tool: String,
    pub version: String,
}

/// All `versions.yml` files under a sample directory, sorted
pub fn find_versions_files(path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "versions.yml")
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

pub fn parse_versions(paths: &[PathBuf], sample: &str) -> anyhow::Result<Vec<ToolVersion>> {
    let mut versions = Vec::new();
    for path in paths {
        let Value::Object(processes) = parse_yaml(path)? else {
            anyhow::bail!("Expected a mapping of processes in {}", path.display());
        };
        for (process, tools) in processes {
            let Value::Object(tools) = tools else {
                anyhow::bail!("Expected a mapping of tools for '{}' in {}", process, path.display());
            };
            for (tool, version) in tools {
                versions.push(ToolVersion {
                    sample: sample.to_string(),
                    process: process.clone(),
                    tool,
                    version: render_field(&version),
                });
            }
        }
    }
    Ok(versions)
}
