//! The per-sample output files that feed the summary report.

use std::path::{Path, PathBuf};

use super::qc;
use super::ParserKind;

/// Bulky nested columns left out of the tab-delimited report
pub const EXCLUDE_COLUMNS: &[&str] = &[
    "qc_final_per_base_quality",
    "qc_final_r1_per_base_quality",
    "qc_final_r2_per_base_quality",
    "qc_final_read_lengths",
    "qc_final_r1_read_lengths",
    "qc_final_r2_read_lengths",
    "qc_original_is_paired",
    "qc_original_per_base_quality",
    "qc_original_r1_per_base_quality",
    "qc_original_r2_per_base_quality",
    "qc_original_read_lengths",
    "qc_original_r1_read_lengths",
    "qc_original_r2_read_lengths",
    "amrfinderplus_hits",
    "amrfinderplus_genes_hits",
    "amrfinderplus_proteins_hits",
];

/// Expected files for one sample and whether they are all present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsableFiles {
    /// Files to parse, in merge order
    pub files: Vec<(PathBuf, ParserKind)>,
    /// Required files that were not found
    pub missing: Vec<PathBuf>,
}

impl ParsableFiles {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Annotation summaries in priority order; the first one present is used
fn annotation_candidates(path: &Path, name: &str) -> [(&'static str, PathBuf); 2] {
    let annotator = path.join("bactopia-main").join("annotator");
    [
        ("prokka", annotator.join("prokka").join(format!("{}.txt", name))),
        ("bakta", annotator.join("bakta").join(format!("{}.txt", name))),
    ]
}

/// A QC slot is satisfied by the merged summary or by both mate summaries
fn qc_present(path: &Path) -> bool {
    qc::locate_inputs(path).is_some()
}

/// Enumerate the outputs a complete Bactopia sample has.
///
/// Completeness is all or nothing: the caller must not parse a sample with a
/// non-empty `missing` list.
pub fn get_parsable_files(path: &Path, name: &str) -> ParsableFiles {
    let main = path.join("bactopia-main");
    let tools = path.join("bactopia-tools");
    let qc_summary = main.join("qc").join("summary");
    let sketcher = main.join("sketcher").join("summary");

    let required = vec![
        (main.join("gather").join(format!("{}-meta.tsv", name)), ParserKind::Gather),
        (main.join("assembler").join(format!("{}.tsv", name)), ParserKind::Assembler),
        (qc_summary.join(format!("{}-original.json", name)), ParserKind::Qc),
        (qc_summary.join(format!("{}-final.json", name)), ParserKind::Qc),
        (sketcher.join(format!("{}-mash-refseq88-k21.txt", name)), ParserKind::Sketcher),
        (sketcher.join(format!("{}-sourmash-gtdb-rs207-k31.txt", name)), ParserKind::Sketcher),
        (tools.join("amrfinderplus").join(format!("{}-genes.tsv", name)), ParserKind::AmrFinderPlus),
        (tools.join("amrfinderplus").join(format!("{}-proteins.tsv", name)), ParserKind::AmrFinderPlus),
        (tools.join("mlst").join(format!("{}.tsv", name)), ParserKind::Mlst),
    ];

    let mut files = Vec::new();
    let mut missing = Vec::new();
    for (file, kind) in required {
        let present = match kind {
            ParserKind::Qc => qc_present(&file),
            _ => file.exists(),
        };
        if present {
            files.push((file, kind));
        } else {
            missing.push(file);
        }
    }

    let candidates = annotation_candidates(path, name);
    match candidates.iter().find(|(_, file)| file.exists()) {
        Some((tool, file)) => {
            log::debug!("\tUsing {} annotation for {}", tool, name);
            files.push((file.clone(), ParserKind::Annotator));
        }
        None => missing.push(candidates[0].1.clone()),
    }

    ParsableFiles { files, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn complete_layout(root: &Path, name: &str) {
        for file in [
            format!("bactopia-main/gather/{}-meta.tsv", name),
            format!("bactopia-main/assembler/{}.tsv", name),
            format!("bactopia-main/qc/summary/{}-original.json", name),
            format!("bactopia-main/qc/summary/{}_R1-final.json", name),
            format!("bactopia-main/qc/summary/{}_R2-final.json", name),
            format!("bactopia-main/sketcher/summary/{}-mash-refseq88-k21.txt", name),
            format!("bactopia-main/sketcher/summary/{}-sourmash-gtdb-rs207-k31.txt", name),
            format!("bactopia-main/annotator/bakta/{}.txt", name),
            format!("bactopia-tools/amrfinderplus/{}-genes.tsv", name),
            format!("bactopia-tools/mlst/{}.tsv", name),
        ] {
            touch(&root.join(file));
        }
    }

    #[test]
    fn test_missing_only_proteins() {
        let dir = TempDir::new().unwrap();
        complete_layout(dir.path(), "S1");

        let parsables = get_parsable_files(dir.path(), "S1");
        assert!(!parsables.is_complete());
        assert_eq!(
            parsables.missing,
            vec![dir.path().join("bactopia-tools/amrfinderplus/S1-proteins.tsv")]
        );
    }

    #[test]
    fn test_complete_with_bakta() {
        let dir = TempDir::new().unwrap();
        complete_layout(dir.path(), "S1");
        touch(&dir.path().join("bactopia-tools/amrfinderplus/S1-proteins.tsv"));

        let parsables = get_parsable_files(dir.path(), "S1");
        assert!(parsables.is_complete());
        assert_eq!(parsables.files.len(), 10);
        let (annotation, kind) = parsables.files.last().unwrap();
        assert_eq!(*kind, ParserKind::Annotator);
        assert!(annotation.ends_with("annotator/bakta/S1.txt"));
    }

    #[test]
    fn test_prokka_preferred_over_bakta() {
        let dir = TempDir::new().unwrap();
        complete_layout(dir.path(), "S1");
        touch(&dir.path().join("bactopia-main/annotator/prokka/S1.txt"));

        let parsables = get_parsable_files(dir.path(), "S1");
        let annotations: Vec<&PathBuf> = parsables
            .files
            .iter()
            .filter(|(_, kind)| *kind == ParserKind::Annotator)
            .map(|(file, _)| file)
            .collect();
        assert_eq!(annotations.len(), 1);
        assert!(annotations[0].ends_with("annotator/prokka/S1.txt"));
    }

    #[test]
    fn test_missing_annotation_and_qc() {
        let dir = TempDir::new().unwrap();
        let parsables = get_parsable_files(dir.path(), "S1");
        assert_eq!(parsables.files.len(), 0);
        assert_eq!(parsables.missing.len(), 10);
        assert!(parsables.missing[3].ends_with("qc/summary/S1-final.json"));
        assert!(parsables.missing[9].ends_with("annotator/prokka/S1.txt"));
    }
}
