//! Aggregation of every sample in a Bactopia results root
//!
//! One `Aggregator` lives for exactly one run. It walks the samples in name
//! order, ranks the complete ones, records the ones that failed upstream, and
//! keeps the counts the summary report needs.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::RankCutoffSet;
use crate::parsers::error::{parse_errors, ErrorRecord};
use crate::parsers::parsables::get_parsable_files;
use crate::parsers::versions::{find_versions_files, parse_versions, ToolVersion};
use crate::rank::{classify, Rank, RankInputs};
use crate::record::{RankedSample, SampleRecord};
use crate::scan::{parse_bactopia_directory, BactopiaSample};

/// A sample that appears in the exclusion report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub sample: String,
    /// `Rank::Exclude` for failed cutoffs, `Rank::QcFail` for error markers
    pub status: Rank,
    pub reason: String,
}

/// A Bactopia sample missing required outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteSample {
    pub sample: String,
    pub missing: Vec<PathBuf>,
}

/// Run-scoped counters, keyed by category name
#[derive(Debug, Clone, Default)]
pub struct SummaryCounts {
    counts: BTreeMap<String, usize>,
    categories: BTreeMap<String, Vec<String>>,
    failed: BTreeMap<String, Vec<String>>,
}

impl SummaryCounts {
    pub fn increment(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_default() += 1;
    }

    pub fn increment_and_append(&mut self, key: &str, sample: &str) {
        self.increment(key);
        self.categories
            .entry(key.to_string())
            .or_default()
            .push(sample.to_string());
    }

    /// Record `sample` as failed for `key` (an error type or `failed-cutoff`)
    pub fn fail(&mut self, key: &str, sample: &str) {
        self.failed.entry(key.to_string()).or_default().push(sample.to_string());
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn category(&self, key: &str) -> &[String] {
        self.categories.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Failed samples by reason, sorted by reason
    pub fn failed(&self) -> &BTreeMap<String, Vec<String>> {
        &self.failed
    }
}

/// Everything one run produced, ready to be written out
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counts: SummaryCounts,
    pub rows: Vec<RankedSample>,
    pub exclusions: Vec<Exclusion>,
    pub incomplete: Vec<IncompleteSample>,
    pub versions: Vec<ToolVersion>,
}

pub struct Aggregator<'a> {
    cutoffs: &'a RankCutoffSet,
    summary: RunSummary,
}

impl<'a> Aggregator<'a> {
    pub fn new(cutoffs: &'a RankCutoffSet) -> Self {
        Self {
            cutoffs,
            summary: RunSummary {
                counts: SummaryCounts::default(),
                rows: Vec::new(),
                exclusions: Vec::new(),
                incomplete: Vec::new(),
                versions: Vec::new(),
            },
        }
    }

    /// Process every sample under `root`
    pub fn run(mut self, root: &Path, show_progress: bool) -> Result<RunSummary> {
        let samples = parse_bactopia_directory(root)?;
        log::info!("Found {} samples in {} to process", samples.len(), root.display());

        let pb = if show_progress {
            let pb = ProgressBar::new(samples.len() as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({percent}%) ETA: {eta}",
                )?
                .progress_chars("=>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        for sample in &samples {
            self.process(sample)?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(self.summary)
    }

    fn process(&mut self, sample: &BactopiaSample) -> Result<()> {
        if !sample.is_bactopia {
            log::debug!(
                "Skipping {} ({}), incomplete or not a Bactopia directory",
                sample.id,
                sample.path.display()
            );
            self.summary.counts.increment_and_append("ignore-unknown", &sample.id);
            return Ok(());
        }

        self.summary.counts.increment("total");
        log::debug!("Processing {} ({})", sample.id, sample.path.display());

        let versions_files = find_versions_files(&sample.path);
        self.summary
            .versions
            .extend(parse_versions(&versions_files, &sample.id)?);

        let errors = parse_errors(&sample.path, &sample.id);
        if !errors.is_empty() {
            self.process_errors(&sample.id, &errors);
            return Ok(());
        }

        let parsables = get_parsable_files(&sample.path, &sample.id);
        if !parsables.is_complete() {
            log::warn!(
                "Skipping {}, missing {} expected file(s)",
                sample.id,
                parsables.missing.len()
            );
            for missing in &parsables.missing {
                log::warn!("\t{}", missing.display());
            }
            self.summary.counts.increment_and_append("incomplete", &sample.id);
            self.summary.incomplete.push(IncompleteSample {
                sample: sample.id.clone(),
                missing: parsables.missing,
            });
            return Ok(());
        }

        let mut record = SampleRecord::new(&sample.id);
        for (path, kind) in &parsables.files {
            record.merge(kind.parse(path, &sample.id)?)?;
        }
        self.process_sample(record)
    }

    /// Record a sample that an upstream step flagged with error markers
    fn process_errors(&mut self, sample: &str, errors: &[ErrorRecord]) {
        let counts = &mut self.summary.counts;
        let mut descriptions = Vec::new();
        for error in errors {
            descriptions.push(error.description.as_str());
            counts.increment(&error.error_type);
            counts.fail(&error.error_type, sample);
        }
        counts.increment("total-excluded");
        counts.increment("qc-failure");

        log::debug!("\t{}: Not processed, reason: {}", sample, descriptions.join("; "));
        self.summary.exclusions.push(Exclusion {
            sample: sample.to_string(),
            status: Rank::QcFail,
            reason: format!("Not processed, reason: {}", descriptions.join(";")),
        });
    }

    /// Rank a fully merged sample and keep its row
    fn process_sample(&mut self, record: SampleRecord) -> Result<()> {
        let inputs = RankInputs::from_record(&record)?;
        let result = classify(self.cutoffs, &inputs);
        let sample = record.sample_id.clone();

        let counts = &mut self.summary.counts;
        counts.increment_and_append("processed", &sample);
        counts.increment_and_append(&result.rank.to_string(), &sample);

        if result.rank == Rank::Exclude {
            counts.increment("total-excluded");
            counts.fail("failed-cutoff", &sample);
            self.summary.exclusions.push(Exclusion {
                sample: sample.clone(),
                status: Rank::Exclude,
                reason: format!("Failed to pass minimum cutoffs, reason: {}", result.reason),
            });
        } else {
            counts.increment("pass");
        }

        log::debug!("\tRank: {} ({})", result.rank, result.reason);
        self.summary.rows.push(record.finalize(result.rank, result.reason));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    /// Sample metrics used to lay out a fake results tree
    pub(crate) struct FakeSample<'a> {
        pub name: &'a str,
        pub coverage: f64,
        pub quality: f64,
        pub read_length: i64,
        pub contigs: i64,
        pub paired: bool,
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn qc_json(name: &str, coverage: f64, quality: f64, read_length: i64) -> String {
        json!({
            "sample": name,
            "qc_stats": {
                "total_bp": 1000,
                "coverage": coverage,
                "read_total": 10,
                "qual_mean": quality,
                "read_mean": read_length,
            },
            "per_base_quality": {"1": quality},
            "read_lengths": {read_length.to_string(): 10},
        })
        .to_string()
    }

    /// Write every output a complete Bactopia sample has
    pub(crate) fn write_sample(root: &Path, sample: &FakeSample) {
        let name = sample.name;
        let dir = root.join("bactopia-samples").join(name);
        let main = dir.join("bactopia-main");
        let tools = dir.join("bactopia-tools");
        let runtype = if sample.paired { "paired-end" } else { "single-end" };

        write(
            &main.join(format!("gather/{}-meta.tsv", name)),
            &format!(
                "sample\truntype\toriginal_runtype\tspecies\tgenome_size\n{}\t{}\t{}\tStaphylococcus aureus\t2800000\n",
                name, runtype, runtype
            ),
        );
        write(
            &main.join(format!("assembler/{}.tsv", name)),
            &format!("sample\ttotal_contig\ttotal_contig_length\n{}\t{}\t2790000\n", name, sample.contigs),
        );
        for phase in ["original", "final"] {
            let summary = main.join("qc/summary");
            if sample.paired {
                // Split coverage evenly across mates so the merged value matches
                let mate = qc_json(name, sample.coverage / 2.0, sample.quality, sample.read_length);
                write(&summary.join(format!("{}_R1-{}.json", name, phase)), &mate);
                write(&summary.join(format!("{}_R2-{}.json", name, phase)), &mate);
            } else {
                let single = qc_json(name, sample.coverage, sample.quality, sample.read_length);
                write(&summary.join(format!("{}-{}.json", name, phase)), &single);
            }
        }
        write(&main.join(format!("sketcher/summary/{}-mash-refseq88-k21.txt", name)), "");
        write(&main.join(format!("sketcher/summary/{}-sourmash-gtdb-rs207-k31.txt", name)), "");
        write(&main.join(format!("annotator/prokka/{}.txt", name)), "CDS: 2650\nrRNA: 6\ntRNA: 58\n");
        write(
            &tools.join(format!("amrfinderplus/{}-genes.tsv", name)),
            "Gene symbol\tClass\nblaZ\tBETA-LACTAM\n",
        );
        write(
            &tools.join(format!("amrfinderplus/{}-proteins.tsv", name)),
            "Gene symbol\tClass\nblaZ\tBETA-LACTAM\n",
        );
        write(
            &tools.join(format!("mlst/{}.tsv", name)),
            &format!("{}.fna.gz\tsaureus\t8\tarcC(3)\n", name),
        );
        write(&main.join("assembler/versions.yml"), "ASSEMBLER:\n  shovill: 1.1.0\n");
    }

    /// Write a sample that stopped with an assembly error
    pub(crate) fn write_failed_sample(root: &Path, name: &str) {
        let main = root.join("bactopia-samples").join(name).join("bactopia-main");
        write(
            &main.join(format!("gather/{}-meta.tsv", name)),
            &format!("sample\tspecies\tgenome_size\n{}\tStaphylococcus aureus\t2800000\n", name),
        );
        write(&main.join(format!("assembler/{}-assembly-error.txt", name)), "Assembled size 10 bp");
    }

    #[test]
    fn test_run_ranks_and_excludes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_sample(
            root,
            &FakeSample { name: "A", coverage: 120.0, quality: 32.0, read_length: 100, contigs: 50, paired: true },
        );
        write_sample(
            root,
            &FakeSample { name: "B", coverage: 30.0, quality: 15.0, read_length: 60, contigs: 300, paired: true },
        );
        write_failed_sample(root, "C");
        write_sample(
            root,
            &FakeSample { name: "D", coverage: 10.0, quality: 30.0, read_length: 100, contigs: 50, paired: false },
        );
        std::fs::create_dir_all(root.join("bactopia-samples/not-a-sample")).unwrap();

        let cutoffs = RankCutoffSet::default();
        let summary = Aggregator::new(&cutoffs).run(root, false).unwrap();

        let ranks: Vec<(&str, Rank)> = summary
            .rows
            .iter()
            .map(|r| (r.sample_id.as_str(), r.rank))
            .collect();
        assert_eq!(ranks, vec![("A", Rank::Gold), ("B", Rank::Bronze), ("D", Rank::Exclude)]);
        assert_eq!(summary.rows[0].reason, "");
        assert_eq!(summary.rows[0].metrics["mlst_st"], json!("8"));
        assert_eq!(summary.rows[0].metrics["annotator_total_CDS"], json!(2650));

        assert_eq!(summary.exclusions.len(), 2);
        assert_eq!(summary.exclusions[0].sample, "C");
        assert_eq!(summary.exclusions[0].status, Rank::QcFail);
        assert!(summary.exclusions[0]
            .reason
            .contains("Assembled size was not withing an acceptable range"));
        assert_eq!(summary.exclusions[1].sample, "D");
        assert_eq!(summary.exclusions[1].status, Rank::Exclude);
        assert_eq!(
            summary.exclusions[1].reason,
            "Failed to pass minimum cutoffs, reason: Low coverage (10.00x, expect >= 20x)"
        );

        let counts = &summary.counts;
        assert_eq!(counts.count("total"), 4);
        assert_eq!(counts.count("pass"), 2);
        assert_eq!(counts.count("gold"), 1);
        assert_eq!(counts.count("bronze"), 1);
        assert_eq!(counts.count("exclude"), 1);
        assert_eq!(counts.count("total-excluded"), 2);
        assert_eq!(counts.count("qc-failure"), 1);
        assert_eq!(counts.count("assembly"), 1);
        assert_eq!(counts.category("ignore-unknown"), ["not-a-sample".to_string()]);
        assert_eq!(counts.failed()["failed-cutoff"], vec!["D".to_string()]);
        assert_eq!(summary.versions.len(), 3);
    }

    #[test]
    fn test_incomplete_sample_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_sample(
            root,
            &FakeSample { name: "A", coverage: 120.0, quality: 32.0, read_length: 100, contigs: 50, paired: true },
        );
        std::fs::remove_file(root.join("bactopia-samples/A/bactopia-tools/mlst/A.tsv")).unwrap();

        let cutoffs = RankCutoffSet::default();
        let summary = Aggregator::new(&cutoffs).run(root, false).unwrap();
        assert!(summary.rows.is_empty());
        assert!(summary.exclusions.is_empty());
        assert_eq!(summary.incomplete.len(), 1);
        assert!(summary.incomplete[0].missing[0].ends_with("mlst/A.tsv"));
        assert_eq!(summary.counts.count("incomplete"), 1);
    }

    #[test]
    fn test_malformed_metric_is_fatal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_sample(
            root,
            &FakeSample { name: "A", coverage: 120.0, quality: 32.0, read_length: 100, contigs: 50, paired: true },
        );
        write(
            &root.join("bactopia-samples/A/bactopia-main/assembler/A.tsv"),
            "sample\ttotal_contig\nA\tmany\n",
        );

        let cutoffs = RankCutoffSet::default();
        assert!(Aggregator::new(&cutoffs).run(root, false).is_err());
    }
}
