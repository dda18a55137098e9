//! Parsers for Mash and Sourmash sketch summaries.
//!
//! The per-sample parser only contributes the join column. [`parse_sourmash`]
//! and [`top_hits`] pull the best matches out of the raw text when they are
//! wanted.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{sample_record, ResultParser};
use crate::record::{value_as_f64, Record};

pub struct SketcherParser;

impl ResultParser for SketcherParser {
    fn name(&self) -> &str {
        "sketcher"
    }

    fn parse(&self, _path: &Path, sample: &str) -> anyhow::Result<Record> {
        Ok(sample_record(sample))
    }
}

/// One row of a Sourmash gather summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourmashMatch {
    pub overlap: String,
    pub p_query: String,
    pub p_match: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourmashResult {
    pub matches: Vec<SourmashMatch>,
    pub no_assignment: String,
}

/// Split `2.7 Mbp   7.3%   99.3%   Staphylococcus aureus` into its columns
fn parse_sourmash_row(line: &str) -> Option<SourmashMatch> {
    let mut fields = line.split_whitespace();
    let value = fields.next()?;
    let unit = fields.next()?;
    let p_query = fields.next()?;
    let p_match = fields.next()?;
    if !p_query.ends_with('%') || !p_match.ends_with('%') {
        return None;
    }
    let name = fields.collect::<Vec<_>>().join(" ");

    Some(SourmashMatch {
        overlap: format!("{} {}", value, unit),
        p_query: p_query.to_string(),
        p_match: p_match.to_string(),
        name,
    })
}

/// Parse Sourmash gather text output.
///
/// ```text
/// overlap     p_query p_match
/// ---------   ------- --------
/// 2.7 Mbp       7.3%   99.3%      Staphylococcus aureus (** 2 equal matches)
/// 430.0 kbp     1.1%    0.5%      Tetrahymena thermophila
///
/// 74.6% (28.0 Mbp) of hashes have no assignment.
/// ```
pub fn parse_sourmash(path: &Path) -> anyhow::Result<SourmashResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open Sourmash summary: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut result = SourmashResult::default();
    let mut in_rows = false;
    let mut in_footer = false;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if in_footer {
            if !line.is_empty() {
                result.no_assignment = line.to_string();
            }
        } else if in_rows {
            if line.is_empty() {
                in_footer = true;
                continue;
            }
            let row = parse_sourmash_row(line)
                .with_context(|| format!("Unexpected Sourmash row in {}: '{}'", path.display(), line))?;
            result.matches.push(row);
        } else if line.starts_with("----") {
            in_rows = true;
        }
    }
    Ok(result)
}

/// Flatten the best Mash screen hit and the first Sourmash match into
/// `sketcher_*` columns.
///
/// `mash` rows come from the headed Mash screen table (`identity`,
/// `shared-hashes`, `median-multiplicity`, `p-value`, `query-ID`,
/// `query-comment`); the hit with the highest identity wins.
pub fn top_hits(mash: &[Record], sourmash: &SourmashResult) -> Record {
    let mut record = Record::new();

    let best = mash
        .iter()
        .filter_map(|row| {
            let identity = row.get("identity").and_then(|v| value_as_f64(v).ok())?;
            Some((identity, row))
        })
        .fold(None, |best: Option<(f64, &Record)>, (identity, row)| match best {
            Some((top, _)) if top >= identity => best,
            _ => Some((identity, row)),
        });

    if let Some((_, row)) = best {
        for (column, key) in [
            ("identity", "sketcher_mash_identity"),
            ("shared-hashes", "sketcher_mash_shared_hashes"),
            ("median-multiplicity", "sketcher_mash_median_multiplicity"),
            ("p-value", "sketcher_mash_p_value"),
            ("query-ID", "sketcher_mash_top_hit"),
            ("query-comment", "sketcher_mash_top_hit_comment"),
        ] {
            if let Some(val) = row.get(column) {
                record.insert(key.to_string(), val.clone());
            }
        }
    }

    if let Some(top) = sourmash.matches.first() {
        record.insert("sketcher_sourmash_overlap".to_string(), Value::String(top.overlap.clone()));
        record.insert("sketcher_sourmash_p_query".to_string(), Value::String(top.p_query.clone()));
        record.insert("sketcher_sourmash_p_match".to_string(), Value::String(top.p_match.clone()));
        record.insert("sketcher_sourmash_top_hit".to_string(), Value::String(top.name.clone()));
    }
    if !sourmash.no_assignment.is_empty() {
        record.insert(
            "sketcher_sourmash_no_assignment".to_string(),
            Value::String(sourmash.no_assignment.clone()),
        );
    }

    record
}
