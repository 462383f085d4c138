//! Per-family output assembly: fetch, orient, rename, write.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};

use crate::confirm::ConfirmedAssignment;
use crate::error::FamsortError;
use crate::seqio::{revcomp, write_fasta};

/// Zero-pad width of the numeric part of emitted sequence ids.
pub const ID_PAD_WIDTH: usize = 10;

/// Monotonic allocator for output sequence ids. One allocator serves
/// the whole run, threaded through the family loop in processing order,
/// so ids never collide or reset between families.
#[derive(Debug, Clone)]
pub struct SeqIdAllocator {
    prefix: String,
    next: u64,
}

impl SeqIdAllocator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 1,
        }
    }

    /// Mint the next id for `family`.
    pub fn next_id(&mut self, family: &str) -> String {
        let id = format!(
            "{}{:0width$}_{}",
            self.prefix,
            self.next,
            family,
            width = ID_PAD_WIDTH
        );
        self.next += 1;
        id
    }

    /// Number of ids minted so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}

/// Source of raw sequences keyed by identifier, so the assembler can be
/// driven from an in-memory map in tests.
pub trait SequenceSource {
    /// Fetch one sequence; `None` when the id is unknown.
    fn fetch(&self, id: &str) -> Option<&str>;
}

impl SequenceSource for IndexMap<String, String> {
    fn fetch(&self, id: &str) -> Option<&str> {
        self.get(id).map(|s| s.as_str())
    }
}

/// One row of the aggregate assignment table.
#[derive(Debug)]
struct AssignmentRow {
    new_id: String,
    source_target: String,
    family: String,
}

/// Toggles for the optional side tables.
#[derive(Debug, Default, Clone)]
pub struct AssembleOptions {
    /// Write the aggregate `<prefix>_table.tsv` assignment table.
    pub write_table: bool,
    /// Write per-family `<prefix>.<family>.sp2seq.txt` maps with this
    /// species label.
    pub sp2seq_species: Option<String>,
}

/// Write one FASTA file per family (plus the optional tables), renaming
/// and orientation-correcting every retained sequence. Families are
/// processed in assignment order; the allocator advances across all of
/// them. Returns the number of sequences emitted.
pub fn assemble_outputs(
    confirmed: &ConfirmedAssignment,
    source: &dyn SequenceSource,
    allocator: &mut SeqIdAllocator,
    out_prefix: &str,
    options: &AssembleOptions,
) -> Result<u64, FamsortError> {
    let mut table_rows: Vec<AssignmentRow> = Vec::new();
    let mut emitted = 0u64;

    for (family, assignment) in &confirmed.families {
        let union = assignment.retained_union();
        let mut renamed: IndexMap<String, String> = IndexMap::with_capacity(union.len());
        let mut sp2seq_lines: Vec<String> = Vec::new();

        for (query, target) in &union {
            let raw = source
                .fetch(query)
                .ok_or_else(|| FamsortError::SequenceLookup { id: query.clone() })?;
            let new_id = allocator.next_id(family);

            let seq = if assignment.reverse.contains(query) {
                debug!("{new_id}: reversed from {query}");
                revcomp(raw)
            } else {
                raw.to_string()
            };

            if options.write_table {
                table_rows.push(AssignmentRow {
                    new_id: new_id.clone(),
                    source_target: target.clone(),
                    family: family.clone(),
                });
            }
            if let Some(species) = &options.sp2seq_species {
                sp2seq_lines.push(format!("{species}:{new_id}"));
            }

            renamed.insert(new_id, seq);
        }

        let fasta_path = format!("{out_prefix}.{family}.fa");
        write_fasta(&fasta_path, &renamed)?;
        emitted += renamed.len() as u64;
        info!(
            "family {family}: wrote {} sequence(s) to {fasta_path}",
            renamed.len()
        );

        if options.sp2seq_species.is_some() {
            write_lines(&format!("{out_prefix}.{family}.sp2seq.txt"), &sp2seq_lines)?;
        }
    }

    if options.write_table {
        let lines: Vec<String> = table_rows
            .iter()
            .map(|row| format!("{}\t{}\t{}", row.new_id, row.source_target, row.family))
            .collect();
        write_lines(&format!("{out_prefix}_table.tsv"), &lines)?;
    }

    Ok(emitted)
}

fn write_lines(path: &str, lines: &[String]) -> Result<(), FamsortError> {
    let write_err = |e: std::io::Error| FamsortError::OutputWrite {
        path: Path::new(path).to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}").map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}
