//! External aligner invocation (BLAST+).

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::FamsortError;

/// Capability interface over the external alignment tool, so the
/// pipeline can run against a canned backend in tests.
pub trait AlignmentBackend {
    /// Align all queries against the reference collection and write the
    /// tabular report to `report_out`.
    fn align_all(&self, queries: &Path, report_out: &Path) -> Result<(), FamsortError>;
}

/// blastn-based backend. The nucleotide database is built on first use
/// and reused when one already exists at the configured prefix.
pub struct BlastnAligner {
    targets: PathBuf,
    database: PathBuf,
    evalue: f64,
    max_target_seqs: u32,
}

impl BlastnAligner {
    pub fn new(targets: &Path, database: &Path, evalue: f64) -> Self {
        Self {
            targets: targets.to_path_buf(),
            database: database.to_path_buf(),
            evalue,
            max_target_seqs: 500,
        }
    }

    /// makeblastdb leaves a .nin index (or .nal for multi-volume
    /// databases) next to the database prefix.
    fn database_exists(&self) -> bool {
        ["nin", "nal"].iter().any(|ext| {
            PathBuf::from(format!("{}.{ext}", self.database.display())).exists()
        })
    }

    fn build_database(&self) -> Result<(), FamsortError> {
        info!("building BLAST database at {}", self.database.display());
        run_tool(
            Command::new("makeblastdb")
                .arg("-in")
                .arg(&self.targets)
                .arg("-dbtype")
                .arg("nucl")
                .arg("-out")
                .arg(&self.database),
            "makeblastdb",
        )
    }
}

impl AlignmentBackend for BlastnAligner {
    fn align_all(&self, queries: &Path, report_out: &Path) -> Result<(), FamsortError> {
        if self.database_exists() {
            info!("reusing existing BLAST database at {}", self.database.display());
        } else {
            self.build_database()?;
        }

        info!("running blastn on {}", queries.display());
        run_tool(
            Command::new("blastn")
                .arg("-task")
                .arg("megablast")
                .arg("-db")
                .arg(&self.database)
                .arg("-query")
                .arg(queries)
                .arg("-evalue")
                .arg(self.evalue.to_string())
                .arg("-max_target_seqs")
                .arg(self.max_target_seqs.to_string())
                .arg("-outfmt")
                .arg("6")
                .arg("-out")
                .arg(report_out),
            "blastn",
        )
    }
}

fn run_tool(cmd: &mut Command, tool: &str) -> Result<(), FamsortError> {
    debug!("running {cmd:?}");
    let output = cmd.output().map_err(|e| FamsortError::AlignerFailed {
        tool: tool.to_string(),
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(FamsortError::AlignerFailed {
            tool: tool.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
