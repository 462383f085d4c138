//! FASTA reading, writing, and reverse-complement.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use indexmap::IndexMap;

use crate::error::FamsortError;

/// Column width of emitted sequence lines.
pub const FASTA_WRAP: usize = 60;

/// Open a text input, transparently decompressing `.gz` files.
pub fn open_text<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, FamsortError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FamsortError::MissingInput {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_gz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a FASTA file into an id -> sequence map.
///
/// The id is the first whitespace-delimited token of the header line,
/// with any leading `lcl|` database marker stripped. Multi-line
/// sequences are concatenated; a repeated id keeps the last sequence.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, String>, FamsortError> {
    let path = path.as_ref();
    let reader = open_text(path)?;

    let mut records = IndexMap::new();
    let mut name: Option<String> = None;
    let mut seq = String::new();

    for line in reader.lines() {
        let line = line.map_err(|e| FamsortError::MissingInput {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(header) = line.strip_prefix('>') {
            if let Some(prev) = name.take() {
                records.insert(prev, std::mem::take(&mut seq));
            }
            let id = header
                .trim_start_matches("lcl|")
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string();
            name = Some(id);
        } else if name.is_some() {
            seq.push_str(line.trim());
        }
    }
    if let Some(prev) = name {
        records.insert(prev, seq);
    }

    Ok(records)
}

/// Write records as wrapped FASTA, in map order.
pub fn write_fasta<P: AsRef<Path>>(
    path: P,
    records: &IndexMap<String, String>,
) -> Result<(), FamsortError> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| FamsortError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    for (name, seq) in records {
        writeln!(out, ">{name}").map_err(write_err)?;
        for chunk in seq.as_bytes().chunks(FASTA_WRAP) {
            out.write_all(chunk).map_err(write_err)?;
            out.write_all(b"\n").map_err(write_err)?;
        }
    }
    out.flush().map_err(write_err)
}

/// Complement of one IUPAC nucleotide code, case-preserving. Bytes with
/// no complement (gaps, stray symbols) pass through unchanged.
fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'R' => b'Y',
        b'Y' => b'R',
        b'S' => b'S',
        b'W' => b'W',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'N' => b'N',
        b'X' => b'X',
        b'a' => b't',
        b't' => b'a',
        b'u' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        b'r' => b'y',
        b'y' => b'r',
        b's' => b's',
        b'w' => b'w',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        b'n' => b'n',
        b'x' => b'x',
        other => other,
    }
}

/// Reverse-complement a nucleotide sequence.
///
/// Applying this twice returns the original sequence for every IUPAC
/// code except U, which folds onto A on the first pass.
pub fn revcomp(seq: &str) -> String {
    seq.bytes().rev().map(complement).map(char::from).collect()
}
