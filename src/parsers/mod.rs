//! Per-tool result parsers.
//!
//! Each parser turns one Bactopia output file into a flat [`Record`] keyed by
//! the `sample` column, with every other column prefixed by the tool that
//! produced it (`assembler_`, `qc_final_`, `mlst_`, ...).
//!
//! # Example
//! ```ignore
//! pub struct MyToolParser;
//!
//! impl ResultParser for MyToolParser {
//!     fn name(&self) -> &str { "mytool" }
//!     fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> { /* ... */ }
//! }
//! ```

pub mod amrfinderplus;
pub mod annotator;
pub mod assembler;
pub mod error;
pub mod gather;
pub mod generic;
pub mod mlst;
pub mod parsables;
pub mod qc;
pub mod sketcher;
pub mod versions;

use std::path::Path;

use crate::record::Record;

pub use amrfinderplus::AmrFinderPlusParser;
pub use annotator::AnnotatorParser;
pub use assembler::AssemblerParser;
pub use gather::GatherParser;
pub use mlst::MlstParser;
pub use qc::QcParser;
pub use sketcher::SketcherParser;

/// Trait for parsing a single tool's per-sample output file.
pub trait ResultParser {
    /// Short name of the tool (e.g., "assembler")
    fn name(&self) -> &str;

    /// Parse the file and return its fields for `sample`.
    fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record>;
}

/// The parser responsible for an expected output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    Gather,
    Assembler,
    Qc,
    Sketcher,
    AmrFinderPlus,
    Mlst,
    Annotator,
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parser().name())
    }
}

impl ParserKind {
    fn parser(&self) -> Box<dyn ResultParser> {
        match self {
            ParserKind::Gather => Box::new(GatherParser),
            ParserKind::Assembler => Box::new(AssemblerParser),
            ParserKind::Qc => Box::new(QcParser),
            ParserKind::Sketcher => Box::new(SketcherParser),
            ParserKind::AmrFinderPlus => Box::new(AmrFinderPlusParser),
            ParserKind::Mlst => Box::new(MlstParser),
            ParserKind::Annotator => Box::new(AnnotatorParser),
        }
    }

    /// Parse `path` with this kind's parser
    pub fn parse(&self, path: &Path, sample: &str) -> anyhow::Result<Record> {
        let parser = self.parser();
        log::debug!("\tParsing {} ({})", path.display(), parser.name());
        parser.parse(path, sample)
    }
}

/// Start a record holding only the join column
pub(crate) fn sample_record(sample: &str) -> Record {
    let mut record = Record::new();
    record.insert(
        crate::record::SAMPLE_KEY.to_string(),
        serde_json::Value::String(sample.to_string()),
    );
    record
}
