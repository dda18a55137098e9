//! Rank cutoff configuration
//!
//! Cutoffs come from the command line, or from a YAML file shaped like:
//!
//! ```yaml
//! gold:   { coverage: 100, quality: 30, length: 95, contigs: 100 }
//! silver: { coverage: 50,  quality: 20, length: 75, contigs: 200 }
//! bronze: { coverage: 20,  quality: 12, length: 49, contigs: 500 }
//! min-assembled-size: 2000000
//! max-assembled-size: 3500000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds a sample must meet to earn one tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierCutoffs {
    /// Minimum estimated coverage (x)
    pub coverage: f64,
    /// Minimum per-read mean quality (Phred)
    pub quality: f64,
    /// Minimum mean read length (bp)
    pub length: u64,
    /// Maximum number of contigs
    pub contigs: u64,
}

/// Full set of rank cutoffs, fixed for the whole run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RankCutoffSet {
    #[serde(default = "default_gold")]
    pub gold: TierCutoffs,

    #[serde(default = "default_silver")]
    pub silver: TierCutoffs,

    #[serde(default = "default_bronze")]
    pub bronze: TierCutoffs,

    /// Smallest acceptable assembled genome size (bp)
    #[serde(default)]
    pub min_assembled_size: Option<u64>,

    /// Largest acceptable assembled genome size (bp)
    #[serde(default)]
    pub max_assembled_size: Option<u64>,
}

pub fn default_gold() -> TierCutoffs {
    TierCutoffs {
        coverage: 100.0,
        quality: 30.0,
        length: 95,
        contigs: 100,
    }
}

pub fn default_silver() -> TierCutoffs {
    TierCutoffs {
        coverage: 50.0,
        quality: 20.0,
        length: 75,
        contigs: 200,
    }
}

pub fn default_bronze() -> TierCutoffs {
    TierCutoffs {
        coverage: 20.0,
        quality: 12.0,
        length: 49,
        contigs: 500,
    }
}

impl Default for RankCutoffSet {
    fn default() -> Self {
        Self {
            gold: default_gold(),
            silver: default_silver(),
            bronze: default_bronze(),
            min_assembled_size: None,
            max_assembled_size: None,
        }
    }
}

impl RankCutoffSet {
    /// Load cutoffs from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cutoffs file: {}", path.display()))?;

        let cutoffs: RankCutoffSet = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML cutoffs: {}", path.display()))?;

        Ok(cutoffs)
    }

    /// Report tiers that are not monotonically looser from gold to bronze.
    ///
    /// The classifier still runs with inverted cutoffs, so these are only
    /// logged as warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let tiers = [("gold", &self.gold), ("silver", &self.silver), ("bronze", &self.bronze)];

        for pair in tiers.windows(2) {
            let (upper_name, upper) = pair[0];
            let (lower_name, lower) = pair[1];
            if lower.coverage > upper.coverage {
                warnings.push(format!(
                    "{} coverage ({}x) is stricter than {} coverage ({}x)",
                    lower_name, lower.coverage, upper_name, upper.coverage
                ));
            }
            if lower.quality > upper.quality {
                warnings.push(format!(
                    "{} quality (Q{}) is stricter than {} quality (Q{})",
                    lower_name, lower.quality, upper_name, upper.quality
                ));
            }
            if lower.length > upper.length {
                warnings.push(format!(
                    "{} read length ({}bp) is stricter than {} read length ({}bp)",
                    lower_name, lower.length, upper_name, upper.length
                ));
            }
            if lower.contigs < upper.contigs {
                warnings.push(format!(
                    "{} contigs ({}) is stricter than {} contigs ({})",
                    lower_name, lower.contigs, upper_name, upper.contigs
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_size(), self.max_size()) {
            if min > max {
                warnings.push(format!(
                    "min-assembled-size ({}) is larger than max-assembled-size ({})",
                    min, max
                ));
            }
        }

        for warning in &warnings {
            log::warn!("Rank cutoffs: {}", warning);
        }
        warnings
    }

    /// Minimum assembled size, if one is set (zero means unset)
    pub fn min_size(&self) -> Option<u64> {
        self.min_assembled_size.filter(|size| *size > 0)
    }

    /// Maximum assembled size, if one is set (zero means unset)
    pub fn max_size(&self) -> Option<u64> {
        self.max_assembled_size.filter(|size| *size > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
gold:
  coverage: 120
  quality: 32
  length: 100
  contigs: 80
bronze:
  coverage: 10
  quality: 10
  length: 40
  contigs: 800
max-assembled-size: 3500000
"#;
        let cutoffs: RankCutoffSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cutoffs.gold.coverage, 120.0);
        assert_eq!(cutoffs.gold.contigs, 80);
        assert_eq!(cutoffs.silver, default_silver());
        assert_eq!(cutoffs.bronze.length, 40);
        assert_eq!(cutoffs.min_assembled_size, None);
        assert_eq!(cutoffs.max_size(), Some(3_500_000));
    }

    #[test]
    fn test_defaults_are_monotonic() {
        assert!(RankCutoffSet::default().validate().is_empty());
    }

    #[test]
    fn test_inverted_tiers_warn() {
        let mut cutoffs = RankCutoffSet::default();
        cutoffs.bronze.coverage = 80.0;
        cutoffs.silver.contigs = 50;
        let warnings = cutoffs.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("silver contigs"));
        assert!(warnings[1].contains("bronze coverage"));
    }

    #[test]
    fn test_zero_size_is_unset() {
        let cutoffs = RankCutoffSet {
            min_assembled_size: Some(0),
            ..RankCutoffSet::default()
        };
        assert_eq!(cutoffs.min_size(), None);
    }
}
