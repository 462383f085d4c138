//! Alignment report parsing.
//!
//! The report is the tab-delimited, headerless table produced by
//! `blastn -outfmt 6`: twelve fixed columns per hit. No filtering or
//! sorting happens here; best-hit selection is the classifier's job.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use crate::error::FamsortError;
use crate::seqio::open_text;

/// One parsed line of the alignment report. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct AlignmentHit {
    pub query_id: String,
    pub target_id: String,
    pub percent_identity: f64,
    pub alignment_length: u64,
    pub mismatches: u64,
    pub gap_opens: u64,
    pub query_start: u64,
    pub query_end: u64,
    pub target_start: u64,
    pub target_end: u64,
    pub evalue: f64,
    pub score: f64,
}

impl AlignmentHit {
    /// A hit is reverse when the query and target coordinate ranges run
    /// in opposite directions (the sign of the span product is negative).
    pub fn is_reverse(&self) -> bool {
        let query_span = self.query_end as i64 - self.query_start as i64;
        let target_span = self.target_end as i64 - self.target_start as i64;
        query_span * target_span < 0
    }
}

/// Read the whole alignment report. An empty file yields an empty vec,
/// the "no hits found" signal.
pub fn read_hits<P: AsRef<Path>>(path: P) -> Result<Vec<AlignmentHit>, FamsortError> {
    let path = path.as_ref();
    let reader = open_text(path)?;

    let mut hits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| FamsortError::MissingInput {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        hits.push(parse_hit_line(&line, path, idx + 1)?);
    }

    Ok(hits)
}

fn parse_hit_line(line: &str, path: &Path, lineno: usize) -> Result<AlignmentHit, FamsortError> {
    let fields: Vec<&str> = line.trim_end().split('\t').collect();
    if fields.len() < 12 {
        return Err(FamsortError::BadRecord {
            path: path.to_path_buf(),
            line: lineno,
            detail: format!("expected 12 tab-separated fields, found {}", fields.len()),
        });
    }

    fn field<T: FromStr>(
        raw: &str,
        name: &str,
        path: &Path,
        lineno: usize,
    ) -> Result<T, FamsortError> {
        raw.parse().map_err(|_| FamsortError::BadRecord {
            path: path.to_path_buf(),
            line: lineno,
            detail: format!("invalid {name}: '{raw}'"),
        })
    }

    Ok(AlignmentHit {
        query_id: fields[0].to_string(),
        target_id: fields[1].to_string(),
        percent_identity: field(fields[2], "percent identity", path, lineno)?,
        alignment_length: field(fields[3], "alignment length", path, lineno)?,
        mismatches: field(fields[4], "mismatch count", path, lineno)?,
        gap_opens: field(fields[5], "gap open count", path, lineno)?,
        query_start: field(fields[6], "query start", path, lineno)?,
        query_end: field(fields[7], "query end", path, lineno)?,
        target_start: field(fields[8], "target start", path, lineno)?,
        target_end: field(fields[9], "target end", path, lineno)?,
        evalue: field(fields[10], "e-value", path, lineno)?,
        score: field(fields[11], "score", path, lineno)?,
    })
}
