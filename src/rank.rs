//! Sample ranking against gold/silver/bronze cutoffs

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{RankCutoffSet, TierCutoffs};
use crate::record::{value_as_bool, value_as_f64, value_as_i64, SampleRecord};

/// Quality tier assigned to a sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Rank {
    /// Passed every gold cutoff with paired-end reads
    Gold,
    /// Passed every silver cutoff with paired-end reads
    Silver,
    /// Passed every bronze cutoff
    Bronze,
    /// Failed at least one bronze cutoff
    Exclude,
    /// Not ranked, an upstream step left an error marker
    QcFail,
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Gold => write!(f, "gold"),
            Rank::Silver => write!(f, "silver"),
            Rank::Bronze => write!(f, "bronze"),
            Rank::Exclude => write!(f, "exclude"),
            Rank::QcFail => write!(f, "qc-fail"),
        }
    }
}

/// Metric columns the classifier reads from a merged sample
pub const COVERAGE_KEY: &str = "qc_final_coverage";
pub const QUALITY_KEY: &str = "qc_final_qual_mean";
pub const READ_LENGTH_KEY: &str = "qc_final_read_mean";
pub const CONTIGS_KEY: &str = "assembler_total_contig";
pub const GENOME_SIZE_KEY: &str = "genome_size";
pub const IS_PAIRED_KEY: &str = "qc_final_is_paired";

/// Metrics used to rank one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankInputs {
    pub coverage: f64,
    pub quality: f64,
    pub read_length: f64,
    pub contigs: i64,
    pub genome_size: i64,
    pub is_paired: bool,
}

impl RankInputs {
    /// Pull the ranking metrics out of a merged sample.
    ///
    /// A missing column or a value that is not numeric is fatal for the run.
    pub fn from_record(record: &SampleRecord) -> Result<Self> {
        Ok(Self {
            coverage: value_as_f64(record.require(COVERAGE_KEY)?)?,
            quality: value_as_f64(record.require(QUALITY_KEY)?)?,
            read_length: value_as_f64(record.require(READ_LENGTH_KEY)?)?,
            contigs: value_as_i64(record.require(CONTIGS_KEY)?)?,
            genome_size: value_as_i64(record.require(GENOME_SIZE_KEY)?)?,
            is_paired: value_as_bool(record.require(IS_PAIRED_KEY)?)?,
        })
    }
}

/// Outcome of ranking one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub rank: Rank,
    /// Sorted, semicolon separated reasons
    pub reason: String,
}

/// Round to two decimals the way the value would be printed
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

fn passes(tier: &TierCutoffs, coverage: f64, quality: f64, length: i64, contigs: i64) -> bool {
    coverage >= tier.coverage
        && quality >= tier.quality
        && length >= tier.length as i64
        && contigs <= tier.contigs as i64
}

/// Explain which checks of `tier` were missed
fn shortfalls(tier: &TierCutoffs, coverage: f64, quality: f64, length: i64, contigs: i64) -> Vec<String> {
    let mut reason = Vec::new();
    if coverage < tier.coverage {
        reason.push(format!("Low coverage ({:.2}x, expect >= {}x)", coverage, tier.coverage));
    }
    if quality < tier.quality {
        reason.push(format!("Poor read quality (Q{:.2}, expect >= Q{})", quality, tier.quality));
    }
    if length < tier.length as i64 {
        reason.push(format!("Short read length ({}bp, expect >= {} bp)", length, tier.length));
    }
    if contigs > tier.contigs as i64 {
        reason.push(format!("Too many contigs ({}, expect <= {})", contigs, tier.contigs));
    }
    reason
}

/// Rank a sample. Always returns a rank.
///
/// Tiers are tried from gold to bronze; a silver or bronze sample lists the
/// checks it missed for the tier above. An excluded sample lists every bronze
/// check it missed. Assembled size bounds only add reasons, they never change
/// the rank.
pub fn classify(cutoffs: &RankCutoffSet, inputs: &RankInputs) -> Classification {
    let coverage = round2(inputs.coverage);
    let quality = round2(inputs.quality);
    let length = round2(inputs.read_length).round_ties_even() as i64;
    let contigs = inputs.contigs;
    let genome_size = inputs.genome_size;

    let mut reason = Vec::new();
    let rank = if inputs.is_paired && passes(&cutoffs.gold, coverage, quality, length, contigs) {
        Rank::Gold
    } else if inputs.is_paired && passes(&cutoffs.silver, coverage, quality, length, contigs) {
        reason.extend(shortfalls(&cutoffs.gold, coverage, quality, length, contigs));
        Rank::Silver
    } else if passes(&cutoffs.bronze, coverage, quality, length, contigs) {
        reason.extend(shortfalls(&cutoffs.silver, coverage, quality, length, contigs));
        if !inputs.is_paired {
            reason.push("Single-end reads".to_string());
        }
        Rank::Bronze
    } else {
        Rank::Exclude
    };

    if rank == Rank::Exclude {
        let bronze = &cutoffs.bronze;
        if coverage < bronze.coverage {
            reason.push(format!("Low coverage ({:.2}x, expect >= {}x)", coverage, bronze.coverage));
        }
        if quality < bronze.quality {
            reason.push(format!("Poor read quality (Q{:.2}, expect >= Q{})", quality, bronze.quality));
        }
        if length < bronze.length as i64 {
            reason.push(format!(
                "Short read length ({:.2}bp, expect >= {} bp)",
                length as f64, bronze.length
            ));
        }
        if contigs > bronze.contigs as i64 {
            reason.push(format!("Too many contigs ({}, expect <= {})", contigs, bronze.contigs));
        }
    }

    if let Some(min) = cutoffs.min_size() {
        if genome_size < min as i64 {
            reason.push(format!(
                "Assembled size is too small ({} bp, expect >= {})",
                genome_size, min
            ));
        }
    }
    if let Some(max) = cutoffs.max_size() {
        if genome_size > max as i64 {
            reason.push(format!(
                "Assembled size is too large ({} bp, expect <= {})",
                genome_size, max
            ));
        }
    }

    reason.sort();
    Classification {
        rank,
        reason: reason.join(";"),
    }
}
