use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use famsort::aligner::BlastnAligner;
use famsort::assemble::AssembleOptions;
use famsort::pipeline::{run, PipelineConfig, PipelineSummary};

/// famsort - classify query sequences into homology families
///
/// Aligns a query FASTA against a reference collection (blastn), assigns
/// each query to the family of its best-scoring target(s), confirms
/// assignments at 90% of each target's best score, and writes one
/// renamed, orientation-corrected FASTA per family.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Query FASTA file to classify
    #[clap(short = 'i', long = "input")]
    input: PathBuf,

    /// Reference (target) FASTA file
    #[clap(short = 't', long = "targets")]
    targets: PathBuf,

    /// Two-column target-to-family link file (delimiter auto-detected)
    #[clap(short = 'm', long = "map")]
    map: PathBuf,

    /// Output prefix for per-family files
    #[clap(short = 'o', long = "output", default_value = "./output")]
    output: String,

    /// Precomputed tabular alignment report; skips running blastn
    #[clap(long = "hits", value_name = "TSV")]
    hits: Option<PathBuf>,

    /// E-value threshold passed to blastn
    #[clap(short = 'e', long = "evalue", default_value = "1e-3")]
    evalue: f64,

    /// BLAST database prefix to reuse across runs. Default: a database
    /// built in the scratch directory and discarded at exit.
    #[clap(short = 'd', long = "database")]
    database: Option<PathBuf>,

    /// Prefix of emitted sequence ids
    #[clap(long = "id-prefix", default_value = "TR")]
    id_prefix: String,

    /// Also write the aggregate assignment table (<output>_table.tsv)
    #[clap(long = "table")]
    table: bool,

    /// Also write per-family species maps (<output>.<family>.sp2seq.txt)
    #[clap(long = "sp2seq", requires = "species")]
    sp2seq: bool,

    /// Species label used in the sp2seq maps
    #[clap(short = 's', long = "species")]
    species: Option<String>,

    /// Scratch directory for intermediates, kept after the run.
    /// Default: a temporary directory removed at exit.
    #[clap(long = "tmp")]
    tmp: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (_scratch, work_dir) = match &args.tmp {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create scratch directory {}", dir.display()))?;
            (None, dir.clone())
        }
        None => {
            let tmp = tempfile::TempDir::with_prefix("famsort.")
                .context("cannot create scratch directory")?;
            let path = tmp.path().to_path_buf();
            (Some(tmp), path)
        }
    };

    if let Some(parent) = Path::new(&args.output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create output directory {}", parent.display()))?;
        }
    }

    let database = args
        .database
        .clone()
        .unwrap_or_else(|| work_dir.join("target_db"));
    let backend = BlastnAligner::new(&args.targets, &database, args.evalue);

    let config = PipelineConfig {
        queries: args.input,
        targets: args.targets,
        family_map: args.map,
        out_prefix: args.output,
        hits: args.hits,
        id_prefix: args.id_prefix,
        work_dir,
        options: AssembleOptions {
            write_table: args.table,
            sp2seq_species: if args.sp2seq { args.species } else { None },
        },
    };

    match run(&config, &backend)? {
        PipelineSummary::NoHits => {
            info!("no hits found; exiting without output files");
        }
        PipelineSummary::Completed {
            families_written,
            sequences_emitted,
            queries_without_hit,
            ambiguous_queries,
        } => {
            info!(
                "wrote {sequences_emitted} sequence(s) across {families_written} family file(s) \
                 ({queries_without_hit} queries without hit, {ambiguous_queries} ambiguous)"
            );
        }
    }

    Ok(())
}
