//! Fatal error taxonomy for the classification pipeline.
//!
//! Only conditions that abort a run live here. Recoverable conditions
//! (a query tying across several families, targets missing from the
//! family map) are logged as warnings and never surface as errors, and
//! an empty alignment report is a successful early exit, not a failure.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FamsortError {
    /// The target-to-family map names the same target twice.
    #[error("duplicate target '{target}' in the target-to-family map")]
    DuplicateTarget { target: String },

    /// A required input could not be opened or read.
    #[error("cannot read {path}: {source}")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external aligner or database builder reported failure.
    #[error("{tool} failed: {detail}")]
    AlignerFailed { tool: String, detail: String },

    /// A line of an input table could not be parsed.
    #[error("malformed record at line {line} of {path}: {detail}")]
    BadRecord {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    /// A retained query id has no sequence in the source.
    #[error("no sequence found for retained query '{id}'")]
    SequenceLookup { id: String },

    /// An output file could not be written.
    #[error("cannot write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
