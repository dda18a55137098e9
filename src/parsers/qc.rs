//! Parser for read QC summaries.
//!
//! Bactopia writes `<name>-{original,final}.json` for single-end reads, or one
//! file per mate (`<name>_R1-final.json`, `<name>_R2-final.json`) for
//! paired-end reads. Mates are merged into a single set of statistics before
//! the keys are prefixed with `qc_original_` or `qc_final_`.

use anyhow::Context;
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};

use super::generic::parse_json;
use super::{sample_record, ResultParser};
use crate::record::{Record, SAMPLE_KEY};

/// Statistics that are additive across mates
const SUMMED_STATS: &[&str] = &["total_bp", "coverage", "read_total"];

/// Pre- or post-trimming QC pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcPhase {
    Original,
    Final,
}

impl QcPhase {
    /// Phase from the summary file name
    pub fn from_path(path: &Path) -> Self {
        let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or_default();
        if file_name.contains("original") {
            QcPhase::Original
        } else {
            QcPhase::Final
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QcPhase::Original => "original",
            QcPhase::Final => "final",
        }
    }
}

/// The QC summary file(s) found for one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QcInputs {
    SingleEnd(PathBuf),
    PairedEnd(PathBuf, PathBuf),
}

/// Per-mate file paths derived from a merged summary path
pub fn mate_paths(path: &Path) -> (PathBuf, PathBuf) {
    let phase = QcPhase::from_path(path).as_str();
    let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or_default();
    let suffix = format!("-{}.json", phase);
    let stem = file_name.strip_suffix(&suffix).unwrap_or(file_name);
    (
        path.with_file_name(format!("{}_R1{}", stem, suffix)),
        path.with_file_name(format!("{}_R2{}", stem, suffix)),
    )
}

/// Locate the QC inputs for a phase; a merged file takes precedence over mates
pub fn locate_inputs(path: &Path) -> Option<QcInputs> {
    if path.exists() {
        return Some(QcInputs::SingleEnd(path.to_path_buf()));
    }

    let (r1, r2) = mate_paths(path);
    if r1.exists() && r2.exists() {
        Some(QcInputs::PairedEnd(r1, r2))
    } else {
        None
    }
}

fn qc_stats<'a>(summary: &'a Value, path: &Path) -> anyhow::Result<&'a Map<String, Value>> {
    summary
        .get("qc_stats")
        .and_then(|s| s.as_object())
        .with_context(|| format!("Missing 'qc_stats' in {}", path.display()))
}

fn required<'a>(summary: &'a Value, key: &str, path: &Path) -> anyhow::Result<&'a Value> {
    summary
        .get(key)
        .with_context(|| format!("Missing '{}' in {}", key, path.display()))
}

fn sum_values(a: &Value, b: &Value) -> Value {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => Value::from(x + y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Number::from_f64(x + y).map(Value::Number).unwrap_or(Value::Null),
            _ => a.clone(),
        },
    }
}

/// Arithmetic mean of two mates; integral means of integers stay integers,
/// everything else is written with four decimals
fn mean_values(a: &Value, b: &Value) -> Value {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let total = x + y;
        if total % 2 == 0 {
            return Value::from(total / 2);
        }
        return Value::String(format!("{:.4}", total as f64 / 2.0));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Value::String(format!("{:.4}", (x + y) / 2.0)),
        _ => a.clone(),
    }
}

/// Merge R1 and R2 summaries: additive stats are summed, the rest averaged.
/// Per-mate quality and length distributions are kept as nested values.
pub fn merge_qc_stats(r1: &Value, r2: &Value, r1_path: &Path, r2_path: &Path) -> anyhow::Result<Map<String, Value>> {
    let r1_stats = qc_stats(r1, r1_path)?;
    let r2_stats = qc_stats(r2, r2_path)?;

    let mut stats = Map::new();
    for (key, r1_val) in r1_stats {
        let merged = match r2_stats.get(key) {
            Some(r2_val) if SUMMED_STATS.contains(&key.as_str()) => sum_values(r1_val, r2_val),
            Some(r2_val) => mean_values(r1_val, r2_val),
            None => r1_val.clone(),
        };
        stats.insert(key.clone(), merged);
    }

    let mut merged = Map::new();
    merged.insert("qc_stats".to_string(), Value::Object(stats));
    merged.insert("r1_per_base_quality".to_string(), required(r1, "per_base_quality", r1_path)?.clone());
    merged.insert("r2_per_base_quality".to_string(), required(r2, "per_base_quality", r2_path)?.clone());
    merged.insert("r1_read_lengths".to_string(), required(r1, "read_lengths", r1_path)?.clone());
    merged.insert("r2_read_lengths".to_string(), required(r2, "read_lengths", r2_path)?.clone());
    Ok(merged)
}

pub struct QcParser;

impl ResultParser for QcParser {
    fn name(&self) -> &str {
        "qc"
    }

    fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> {
        let mut record = sample_record(sample);
        let Some(inputs) = locate_inputs(path) else {
            log::debug!("\tNo QC summary found for {} ({})", sample, path.display());
            return Ok(record);
        };

        let phase = QcPhase::from_path(path).as_str();
        let (summary, is_paired) = match &inputs {
            QcInputs::SingleEnd(r1) => {
                let summary = parse_json(r1)?;
                let summary = summary
                    .as_object()
                    .cloned()
                    .with_context(|| format!("Expected a JSON object in {}", r1.display()))?;
                (summary, false)
            }
            QcInputs::PairedEnd(r1, r2) => {
                (merge_qc_stats(&parse_json(r1)?, &parse_json(r2)?, r1, r2)?, true)
            }
        };
        record.insert(format!("qc_{}_is_paired", phase), Value::Bool(is_paired));

        for (key, val) in summary {
            if key == SAMPLE_KEY {
                continue;
            }
            if key == "qc_stats" {
                if let Value::Object(stats) = val {
                    for (stat, stat_val) in stats {
                        record.insert(format!("qc_{}_{}", phase, stat), stat_val);
                    }
                    continue;
                }
            }
            record.insert(format!("qc_{}_{}", phase, key), val);
        }
        Ok(record)
    }
}
