//! Discovery of sample directories in a Bactopia results root

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Housekeeping entries that are never samples
const IGNORE_LIST: &[&str] = &[".nextflow", ".nextflow.log", "nf-reports", "work"];

/// A directory found under `<root>/bactopia-samples`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BactopiaSample {
    /// Sample name (the directory name)
    pub id: String,
    pub path: PathBuf,
    /// True if the gather step's metadata file is present
    pub is_bactopia: bool,
}

/// True if `path` holds Bactopia output for `name`
pub fn is_bactopia_dir(path: &Path, name: &str) -> bool {
    path.join("bactopia-main")
        .join("gather")
        .join(format!("{}-meta.tsv", name))
        .exists()
}

/// List every sample directory under `<root>/bactopia-samples`, sorted by name
pub fn parse_bactopia_directory(root: &Path) -> Result<Vec<BactopiaSample>> {
    let samples_dir = root.join("bactopia-samples");
    let entries = std::fs::read_dir(&samples_dir)
        .with_context(|| format!("Failed to read Bactopia samples directory: {}", samples_dir.display()))?;

    let mut samples = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", samples_dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let Some(id) = entry.file_name().to_str().map(|name| name.to_string()) else {
            log::warn!("Skipping non UTF-8 directory name: {}", path.display());
            continue;
        };
        if IGNORE_LIST.contains(&id.as_str()) {
            continue;
        }

        let is_bactopia = is_bactopia_dir(&path, &id);
        samples.push(BactopiaSample { id, path, is_bactopia });
    }

    samples.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(samples)
}
