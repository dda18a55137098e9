//! bactopia-summary: rank and summarize a directory of Bactopia results
//!
//! Every sample under `<bactopia>/bactopia-samples` is parsed, merged into one
//! row, and ranked gold/silver/bronze/exclude against read and assembly
//! cutoffs. Samples that failed upstream QC are reported with their reasons.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

mod compress;
mod config;
mod output;
mod parsers;
mod rank;
mod record;
mod scan;
mod summary;

use crate::config::{RankCutoffSet, TierCutoffs};
use crate::output::OutputPaths;
use crate::summary::Aggregator;

/// Summarize and rank Bactopia results
#[derive(Parser, Debug)]
#[command(name = "bactopia-summary")]
#[command(version)]
#[command(about = "Rank and summarize Bactopia results into tab-delimited reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank every sample and write the report, exclusion, versions and summary files
    Summary(SummaryArgs),

    /// Gzip uncompressed outputs in parallel
    Compress(CompressArgs),
}

/// Arguments for the summary subcommand
#[derive(Parser, Debug)]
struct SummaryArgs {
    /// Directory where Bactopia results are stored
    #[arg(short, long)]
    bactopia: PathBuf,

    /// Minimum amount of coverage required for Gold status
    #[arg(long, default_value_t = 100.0)]
    gold_coverage: f64,

    /// Minimum per-read mean quality score required for Gold status
    #[arg(long, default_value_t = 30.0)]
    gold_quality: f64,

    /// Minimum mean read length required for Gold status
    #[arg(long, default_value_t = 95)]
    gold_read_length: u64,

    /// Maximum contig count required for Gold status
    #[arg(long, default_value_t = 100)]
    gold_contigs: u64,

    /// Minimum amount of coverage required for Silver status
    #[arg(long, default_value_t = 50.0)]
    silver_coverage: f64,

    /// Minimum per-read mean quality score required for Silver status
    #[arg(long, default_value_t = 20.0)]
    silver_quality: f64,

    /// Minimum mean read length required for Silver status
    #[arg(long, default_value_t = 75)]
    silver_read_length: u64,

    /// Maximum contig count required for Silver status
    #[arg(long, default_value_t = 200)]
    silver_contigs: u64,

    /// Minimum amount of coverage required to pass
    #[arg(long, default_value_t = 20.0)]
    min_coverage: f64,

    /// Minimum per-read mean quality score required to pass
    #[arg(long, default_value_t = 12.0)]
    min_quality: f64,

    /// Minimum mean read length required to pass
    #[arg(long, default_value_t = 49)]
    min_read_length: u64,

    /// Maximum contig count required to pass
    #[arg(long, default_value_t = 500)]
    max_contigs: u64,

    /// Minimum assembled genome size
    #[arg(long)]
    min_assembled_size: Option<u64>,

    /// Maximum assembled genome size
    #[arg(long)]
    max_assembled_size: Option<u64>,

    /// YAML file with rank cutoffs (replaces the cutoff options above)
    #[arg(long, value_name = "YAML")]
    cutoffs: Option<PathBuf>,

    /// Directory to write output
    #[arg(short, long, default_value = "./")]
    outdir: PathBuf,

    /// Prefix to use for output files
    #[arg(short, long, default_value = "bactopia")]
    prefix: String,

    /// Overwrite existing reports
    #[arg(long)]
    force: bool,

    /// Increase the verbosity of output
    #[arg(long)]
    verbose: bool,

    /// Only critical errors will be printed
    #[arg(long, conflicts_with = "verbose")]
    silent: bool,
}

impl SummaryArgs {
    fn rank_cutoffs(&self) -> Result<RankCutoffSet> {
        if let Some(path) = &self.cutoffs {
            info!("Loading rank cutoffs: {}", path.display());
            return RankCutoffSet::from_yaml(path);
        }

        Ok(RankCutoffSet {
            gold: TierCutoffs {
                coverage: self.gold_coverage,
                quality: self.gold_quality,
                length: self.gold_read_length,
                contigs: self.gold_contigs,
            },
            silver: TierCutoffs {
                coverage: self.silver_coverage,
                quality: self.silver_quality,
                length: self.silver_read_length,
                contigs: self.silver_contigs,
            },
            bronze: TierCutoffs {
                coverage: self.min_coverage,
                quality: self.min_quality,
                length: self.min_read_length,
                contigs: self.max_contigs,
            },
            min_assembled_size: self.min_assembled_size,
            max_assembled_size: self.max_assembled_size,
        })
    }
}

/// Arguments for the compress subcommand
#[derive(Parser, Debug)]
struct CompressArgs {
    /// Directory to search for uncompressed files
    #[arg(short, long)]
    input: PathBuf,

    /// Number of files to compress at once
    #[arg(long, default_value_t = num_cpus::get())]
    cpus: usize,

    /// File extensions to compress (default: fna fasta fastq fq tsv txt)
    #[arg(long = "extension", num_args = 1..)]
    extensions: Option<Vec<String>>,

    /// Keep the uncompressed originals
    #[arg(long)]
    keep: bool,

    /// Increase the verbosity of output
    #[arg(long)]
    verbose: bool,

    /// Only critical errors will be printed
    #[arg(long, conflicts_with = "verbose")]
    silent: bool,
}

fn init_logging(verbose: bool, silent: bool) {
    let log_level = if verbose {
        "debug"
    } else if silent {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Summary(args) => run_summary(args),
        Commands::Compress(args) => run_compress(args),
    }
}

/// Run the summary subcommand: results directory -> reports
fn run_summary(args: SummaryArgs) -> Result<()> {
    init_logging(args.verbose, args.silent);
    info!("bactopia-summary v{}", env!("CARGO_PKG_VERSION"));

    let cutoffs = args.rank_cutoffs()?;
    if !cutoffs.validate().is_empty() {
        warn!("Rank cutoffs are not monotonically looser from gold to bronze");
    }

    // Refuse to clobber before any sample is touched
    let paths = OutputPaths::new(&args.outdir, &args.prefix);
    paths.prepare(args.force)?;

    let summary = Aggregator::new(&cutoffs).run(&args.bactopia, !args.silent)?;
    output::write_reports(&summary, &cutoffs, &paths)?;

    let counts = &summary.counts;
    info!(
        "Done! {} samples: {} passed, {} excluded, {} incomplete",
        counts.count("total"),
        counts.count("pass"),
        counts.count("total-excluded"),
        counts.count("incomplete")
    );
    Ok(())
}

/// Run the compress subcommand
fn run_compress(args: CompressArgs) -> Result<()> {
    init_logging(args.verbose, args.silent);
    info!("bactopia-summary compress v{}", env!("CARGO_PKG_VERSION"));

    let extensions = args.extensions.unwrap_or_else(|| {
        compress::DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    });
    info!("Compressing *.{{{}}} with {} threads", extensions.join(","), args.cpus);

    let stats = compress::compress_directory(&args.input, &extensions, args.cpus, args.keep, !args.silent)?;
    info!("Compressed {} files", stats.compressed);
    if stats.failed > 0 {
        anyhow::bail!("Failed to compress {} file(s)", stats.failed);
    }
    Ok(())
}
