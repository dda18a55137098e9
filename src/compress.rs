//! Parallel gzip compression of uncompressed Bactopia outputs

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extensions compressed when none are given
pub const DEFAULT_EXTENSIONS: &[&str] = &["fna", "fasta", "fastq", "fq", "tsv", "txt"];

/// Result of a compression run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressStats {
    pub compressed: usize,
    pub failed: usize,
}

/// Uncompressed files under `input` whose extension is in `extensions`, sorted
pub fn find_uncompressed(input: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e != "gz" && extensions.iter().any(|ext| ext == e))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` to `<path>.gz`, removing the original unless `keep` is set
pub fn compress_file(path: &Path, keep: bool) -> Result<PathBuf> {
    let output = gz_path(path);
    let input = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let file = File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;

    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    std::io::copy(&mut BufReader::new(input), &mut encoder)
        .with_context(|| format!("Failed to compress {}", path.display()))?;
    encoder.finish()?.flush()?;

    if !keep {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(output)
}

/// Compress every matching file under `input` on a pool of `cpus` threads.
///
/// A file that fails is logged and counted; the others still run.
pub fn compress_directory(
    input: &Path,
    extensions: &[String],
    cpus: usize,
    keep: bool,
    show_progress: bool,
) -> Result<CompressStats> {
    if !input.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", input.display());
    }

    let files = find_uncompressed(input, extensions);
    log::info!("Found {} uncompressed files in {}", files.len(), input.display());
    if files.is_empty() {
        return Ok(CompressStats::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cpus.max(1))
        .build()
        .context("Failed to build thread pool")?;

    let pb = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) ETA: {eta}",
            )?
            .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let failed = AtomicUsize::new(0);
    pool.install(|| {
        files.par_iter().for_each(|path| {
            match compress_file(path, keep) {
                Ok(output) => log::debug!("Compressed {}", output.display()),
                Err(e) => {
                    log::error!("{:#}", e);
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            pb.inc(1);
        });
    });
    pb.finish_and_clear();

    let failed = failed.into_inner();
    Ok(CompressStats {
        compressed: files.len() - failed,
        failed,
    })
}
