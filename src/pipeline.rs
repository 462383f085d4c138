//! End-to-end classification pipeline.
//!
//! Strictly sequential: index and hit table feed best-hit selection,
//! selection feeds confirmation, confirmation feeds output assembly.
//! The only external calls are the aligner backend and file I/O, both
//! synchronous whole-result operations. Output is not transactional:
//! a failure mid-run can leave some per-family files already written.

use std::path::PathBuf;

use log::info;

use crate::aligner::AlignmentBackend;
use crate::assemble::{assemble_outputs, AssembleOptions, SeqIdAllocator};
use crate::classify::select_best_hits;
use crate::confirm::confirm;
use crate::error::FamsortError;
use crate::family_index::{read_family_map, TargetFamilyIndex};
use crate::hits::read_hits;
use crate::seqio::read_fasta;

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Query FASTA to classify.
    pub queries: PathBuf,
    /// Reference (target) FASTA.
    pub targets: PathBuf,
    /// Two-column target-to-family link file.
    pub family_map: PathBuf,
    /// Prefix of every produced file.
    pub out_prefix: String,
    /// Precomputed alignment report; when set the backend is not invoked.
    pub hits: Option<PathBuf>,
    /// Prefix of emitted sequence ids.
    pub id_prefix: String,
    /// Scratch directory for the intermediate report.
    pub work_dir: PathBuf,
    pub options: AssembleOptions,
}

/// Run outcome, for logging and tests.
#[derive(Debug)]
pub enum PipelineSummary {
    /// The report was empty: successful early exit, no output files.
    NoHits,
    Completed {
        families_written: usize,
        sequences_emitted: u64,
        queries_without_hit: usize,
        ambiguous_queries: usize,
    },
}

/// Run the whole pipeline. Fatal conditions abort with a typed error;
/// ambiguity and unmapped targets are logged and survive.
pub fn run(
    config: &PipelineConfig,
    backend: &dyn AlignmentBackend,
) -> Result<PipelineSummary, FamsortError> {
    let queries = read_fasta(&config.queries)?;
    let targets = read_fasta(&config.targets)?;
    let target_ids: Vec<String> = targets.keys().cloned().collect();
    info!(
        "{} queries against {} targets",
        queries.len(),
        target_ids.len()
    );

    let pairs = read_family_map(&config.family_map)?;
    let index = TargetFamilyIndex::build(pairs, &target_ids)?;
    info!(
        "{} targets across {} families",
        index.num_targets(),
        index.num_families()
    );

    let report = match &config.hits {
        Some(path) => path.clone(),
        None => {
            let path = config.work_dir.join("queries_targets.hits.tsv");
            backend.align_all(&config.queries, &path)?;
            path
        }
    };

    let hits = read_hits(&report)?;
    if hits.is_empty() {
        info!("alignment produced no hits; nothing to classify");
        return Ok(PipelineSummary::NoHits);
    }
    info!("loaded {} alignment hits", hits.len());

    let query_ids: Vec<String> = queries.keys().cloned().collect();
    let selection = select_best_hits(&query_ids, &hits, &index);
    let confirmed = confirm(&selection.groups);

    let mut allocator = SeqIdAllocator::new(&config.id_prefix);
    let emitted = assemble_outputs(
        &confirmed,
        &queries,
        &mut allocator,
        &config.out_prefix,
        &config.options,
    )?;

    Ok(PipelineSummary::Completed {
        families_written: confirmed.families.len(),
        sequences_emitted: emitted,
        queries_without_hit: selection.no_hit.len(),
        ambiguous_queries: selection.ambiguous,
    })
}
