//! Report generation and output

use anyhow::{Context, Result};
use indexmap::IndexSet;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{RankCutoffSet, TierCutoffs};
use crate::parsers::parsables::EXCLUDE_COLUMNS;
use crate::record::{render_field, RankedSample};
use crate::summary::{Exclusion, RunSummary};

/// Columns that always lead the full report, in this order
const PREFIX_COLUMNS: &[&str] = &[
    "sample",
    "rank",
    "reason",
    "genome_size",
    "species",
    "runtype",
    "original_runtype",
    "mlst_scheme",
    "mlst_st",
];

/// Paths of every file a summary run writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub outdir: PathBuf,
    pub report: PathBuf,
    pub exclusion: PathBuf,
    pub summary: PathBuf,
    pub versions: PathBuf,
}

impl OutputPaths {
    pub fn new(outdir: &Path, prefix: &str) -> Self {
        Self {
            outdir: outdir.to_path_buf(),
            report: outdir.join(format!("{}-report.tsv", prefix)),
            exclusion: outdir.join(format!("{}-exclude.tsv", prefix)),
            summary: outdir.join(format!("{}-summary.txt", prefix)),
            versions: outdir.join(format!("{}-versions.tsv", prefix)),
        }
    }

    fn all(&self) -> [&Path; 4] {
        [&self.report, &self.exclusion, &self.summary, &self.versions]
    }

    /// Refuse to clobber earlier results unless `force` is set, then create the
    /// output directory. Nothing is written if this fails.
    pub fn prepare(&self, force: bool) -> Result<()> {
        for path in self.all() {
            if path.exists() && !force {
                anyhow::bail!(
                    "Output file {} already exists, use --force to overwrite",
                    path.display()
                );
            }
        }
        std::fs::create_dir_all(&self.outdir)
            .with_context(|| format!("Failed to create output directory: {}", self.outdir.display()))
    }
}

/// Python-style title case: the first letter of each alphabetic run is upper case
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Collapse a classifier reason into a stable label, e.g.
/// `Low coverage (5.00x, expect >= 20x);Too many contigs (900, ...)` becomes
/// `Low Coverage;Too Many Contigs`
pub fn cutoff_label(reason: &str) -> String {
    let mut labels: Vec<String> = reason
        .split(';')
        .map(|part| title_case(part.split('(').next().unwrap_or_default().trim()))
        .collect();
    labels.sort();
    labels.join(";")
}

/// How many excluded samples share each combination of failed cutoffs
pub fn cutoff_breakdown(rows: &[RankedSample]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows.iter().filter(|r| r.rank == crate::rank::Rank::Exclude) {
        *counts.entry(cutoff_label(&row.reason)).or_insert(0) += 1;
    }
    counts
}

/// Column order of the full report: prefix columns first, then every other
/// column in first-seen order, minus the bulky nested ones
pub fn report_columns(rows: &[RankedSample]) -> Vec<String> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for row in rows {
        seen.extend(row.metrics.keys().map(|k| k.as_str()));
        seen.insert("rank");
        seen.insert("reason");
    }

    let mut columns: Vec<String> = PREFIX_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(
        seen.into_iter()
            .filter(|c| !PREFIX_COLUMNS.contains(c) && !EXCLUDE_COLUMNS.contains(c))
            .map(|c| c.to_string()),
    );
    columns
}

fn report_field(row: &RankedSample, column: &str) -> String {
    match column {
        "rank" => row.rank.to_string(),
        "reason" => row.reason.clone(),
        _ => row.metrics.get(column).map(render_field).unwrap_or_default(),
    }
}

/// Write the full report, one row per ranked sample
pub fn write_report_tsv(rows: &[RankedSample], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;

    let columns = report_columns(rows);
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| report_field(row, c)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the exclusion report in processing order
pub fn write_exclusion_tsv(exclusions: &[Exclusion], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create exclusion report: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "sample\tstatus\treason")?;
    for exclusion in exclusions {
        writeln!(writer, "{}\t{}\t{}", exclusion.sample, exclusion.status, exclusion.reason)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every tool version reported by every sample
pub fn write_versions_tsv(summary: &RunSummary, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create versions report: {}", path.display()))?;

    writer.write_record(["sample", "process", "tool", "version"])?;
    for version in &summary.versions {
        writer.write_record([&version.sample, &version.process, &version.tool, &version.version])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_tier(writer: &mut impl Write, name: &str, tier: &TierCutoffs) -> Result<()> {
    writeln!(writer, "    {}:", name)?;
    writeln!(writer, "        Coverage >= {}x", tier.coverage)?;
    writeln!(writer, "        Quality >= Q{}", tier.quality)?;
    writeln!(writer, "        Read Length >= {}bp", tier.length)?;
    writeln!(writer, "        Total Contigs < {}", tier.contigs)?;
    Ok(())
}

fn size_bound(bound: Option<u64>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_else(|| "None".to_string())
}

/// Render the human-readable summary
pub fn render_summary(summary: &RunSummary, cutoffs: &RankCutoffSet, paths: &OutputPaths) -> Result<String> {
    let counts = &summary.counts;
    let mut out: Vec<u8> = Vec::new();
    let w = &mut out;

    writeln!(w, "Bactopia Summary Report")?;
    writeln!(w)?;
    writeln!(w, "Total Samples: {}", counts.count("total"))?;
    writeln!(w)?;
    writeln!(w, "Passed: {}", counts.count("pass"))?;
    writeln!(w, "    Gold: {}", counts.count("gold"))?;
    writeln!(w, "    Silver: {}", counts.count("silver"))?;
    writeln!(w, "    Bronze: {}", counts.count("bronze"))?;
    writeln!(w)?;
    writeln!(w, "Excluded: {}", counts.count("total-excluded"))?;
    writeln!(w, "    Failed Cutoff: {}", counts.count("exclude"))?;
    for (label, count) in cutoff_breakdown(&summary.rows) {
        writeln!(w, "        {}: {}", label, count)?;
    }
    writeln!(w)?;
    writeln!(w, "    QC Failure: {}", counts.count("qc-failure"))?;
    for (error_type, samples) in counts.failed() {
        if error_type == "failed-cutoff" {
            continue;
        }
        writeln!(w, "        {}: {}", title_case(&error_type.replace('-', " ")), samples.len())?;
    }
    writeln!(w)?;
    let incomplete = counts.count("incomplete");
    if incomplete > 0 {
        writeln!(w, "Incomplete: {}", incomplete)?;
        writeln!(w)?;
    }

    writeln!(w, "Reports:")?;
    writeln!(w, "    Full Report (txt): {}", paths.report.display())?;
    writeln!(w, "    Exclusion: {}", paths.exclusion.display())?;
    writeln!(w, "    Summary: {}", paths.summary.display())?;
    writeln!(w, "    Versions: {}", paths.versions.display())?;
    writeln!(w)?;

    writeln!(w, "Rank Cutoffs:")?;
    write_tier(w, "Gold", &cutoffs.gold)?;
    write_tier(w, "Silver", &cutoffs.silver)?;
    write_tier(w, "Bronze", &cutoffs.bronze)?;
    writeln!(w)?;

    writeln!(w, "Assembly Length Exclusions:")?;
    writeln!(w, "    Minimum: {}", size_bound(cutoffs.min_size()))?;
    writeln!(w, "    Maximum: {}", size_bound(cutoffs.max_size()))?;

    Ok(String::from_utf8(out)?)
}

/// Write all four outputs. Call `OutputPaths::prepare` first.
pub fn write_reports(summary: &RunSummary, cutoffs: &RankCutoffSet, paths: &OutputPaths) -> Result<()> {
    write_report_tsv(&summary.rows, &paths.report)?;
    write_exclusion_tsv(&summary.exclusions, &paths.exclusion)?;
    write_versions_tsv(summary, &paths.versions)?;

    let text = render_summary(summary, cutoffs, paths)?;
    std::fs::write(&paths.summary, &text)
        .with_context(|| format!("Failed to write summary: {}", paths.summary.display()))?;

    log::info!("Full report: {}", paths.report.display());
    log::info!("Exclusion report: {}", paths.exclusion.display());
    log::info!("Versions report: {}", paths.versions.display());
    log::info!("Summary: {}", paths.summary.display());
    Ok(())
}
