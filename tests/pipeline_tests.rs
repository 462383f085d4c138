use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use famsort::aligner::AlignmentBackend;
use famsort::assemble::AssembleOptions;
use famsort::error::FamsortError;
use famsort::pipeline::{run, PipelineConfig, PipelineSummary};
use famsort::seqio::revcomp;

/// Backend that writes a canned report instead of running blastn.
struct CannedAligner {
    report: String,
}

impl AlignmentBackend for CannedAligner {
    fn align_all(&self, _queries: &Path, report_out: &Path) -> Result<(), FamsortError> {
        fs::write(report_out, &self.report).map_err(|e| FamsortError::OutputWrite {
            path: report_out.to_path_buf(),
            source: e,
        })
    }
}

/// Backend that must never be reached.
struct UnreachableAligner;

impl AlignmentBackend for UnreachableAligner {
    fn align_all(&self, _queries: &Path, _report_out: &Path) -> Result<(), FamsortError> {
        Err(FamsortError::AlignerFailed {
            tool: "blastn".to_string(),
            detail: "backend should not have been invoked".to_string(),
        })
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Standard two-target fixture: T1 -> F1, T2 -> F2.
fn fixture(dir: &Path, out_prefix: &str) -> PipelineConfig {
    let queries = write_file(
        dir,
        "queries.fa",
        ">Q1\nACGTTGCAAC\n>Q2\nTTGACAGGTA\n",
    );
    let targets = write_file(dir, "targets.fa", ">T1\nACGTTGCAAC\n>T2\nTTGACAGGTA\n");
    let map = write_file(dir, "map.tsv", "T1\tF1\nT2\tF2\n");

    PipelineConfig {
        queries,
        targets,
        family_map: map,
        out_prefix: dir.join(out_prefix).to_str().unwrap().to_string(),
        hits: None,
        id_prefix: "TR".to_string(),
        work_dir: dir.to_path_buf(),
        options: AssembleOptions::default(),
    }
}

fn family_file(config: &PipelineConfig, family: &str) -> String {
    format!("{}.{family}.fa", config.out_prefix)
}

#[test]
fn test_single_confirmed_hit_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path(), "out");
    let backend = CannedAligner {
        report: "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n".to_string(),
    };

    let summary = run(&config, &backend).unwrap();
    match summary {
        PipelineSummary::Completed {
            families_written,
            sequences_emitted,
            queries_without_hit,
            ambiguous_queries,
        } => {
            assert_eq!(families_written, 1);
            assert_eq!(sequences_emitted, 1);
            assert_eq!(queries_without_hit, 1); // Q2 had no hit
            assert_eq!(ambiguous_queries, 0);
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let content = fs::read_to_string(family_file(&config, "F1")).unwrap();
    assert_eq!(content, ">TR0000000001_F1\nACGTTGCAAC\n");
    assert!(!Path::new(&family_file(&config, "F2")).exists());
}

#[test]
fn test_reverse_hit_is_reverse_complemented() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path(), "out");
    // target coordinates run backwards: opposite strand
    let backend = CannedAligner {
        report: "Q1\tT1\t100\t100\t0\t0\t1\t100\t100\t1\t1e-50\t190\n".to_string(),
    };

    run(&config, &backend).unwrap();

    let content = fs::read_to_string(family_file(&config, "F1")).unwrap();
    let expected = format!(">TR0000000001_F1\n{}\n", revcomp("ACGTTGCAAC"));
    assert_eq!(content, expected);
}

#[test]
fn test_two_family_tie_appears_in_both_outputs() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path(), "out");
    let backend = CannedAligner {
        report: "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n\
                 Q1\tT2\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n"
            .to_string(),
    };

    let summary = run(&config, &backend).unwrap();
    match summary {
        PipelineSummary::Completed {
            families_written,
            sequences_emitted,
            ambiguous_queries,
            ..
        } => {
            assert_eq!(families_written, 2);
            assert_eq!(sequences_emitted, 2);
            assert_eq!(ambiguous_queries, 1);
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    // same raw sequence in both families, under run-wide unique ids
    let f1 = fs::read_to_string(family_file(&config, "F1")).unwrap();
    let f2 = fs::read_to_string(family_file(&config, "F2")).unwrap();
    assert_eq!(f1, ">TR0000000001_F1\nACGTTGCAAC\n");
    assert_eq!(f2, ">TR0000000002_F2\nACGTTGCAAC\n");
}

#[test]
fn test_empty_report_is_success_without_outputs() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path(), "out");
    let backend = CannedAligner {
        report: String::new(),
    };

    let summary = run(&config, &backend).unwrap();
    assert!(matches!(summary, PipelineSummary::NoHits));
    assert!(!Path::new(&family_file(&config, "F1")).exists());
    assert!(!Path::new(&family_file(&config, "F2")).exists());
}

#[test]
fn test_below_threshold_query_is_dropped() {
    let dir = TempDir::new().unwrap();
    let config = fixture(dir.path(), "out");
    // Q2's best score on T1 is under 90% of Q1's
    let backend = CannedAligner {
        report: "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n\
                 Q2\tT1\t80\t100\t20\t0\t1\t100\t1\t100\t1e-10\t100\n"
            .to_string(),
    };

    run(&config, &backend).unwrap();

    let content = fs::read_to_string(family_file(&config, "F1")).unwrap();
    assert_eq!(content, ">TR0000000001_F1\nACGTTGCAAC\n");
}

#[test]
fn test_optional_tables_are_written() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture(dir.path(), "out");
    config.options = AssembleOptions {
        write_table: true,
        sp2seq_species: Some("Danio_rerio".to_string()),
    };
    let backend = CannedAligner {
        report: "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n\
                 Q2\tT2\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t185\n"
            .to_string(),
    };

    run(&config, &backend).unwrap();

    let table = fs::read_to_string(format!("{}_table.tsv", config.out_prefix)).unwrap();
    assert_eq!(
        table,
        "TR0000000001_F1\tT1\tF1\nTR0000000002_F2\tT2\tF2\n"
    );

    let sp2seq = fs::read_to_string(format!("{}.F1.sp2seq.txt", config.out_prefix)).unwrap();
    assert_eq!(sp2seq, "Danio_rerio:TR0000000001_F1\n");
    let sp2seq = fs::read_to_string(format!("{}.F2.sp2seq.txt", config.out_prefix)).unwrap();
    assert_eq!(sp2seq, "Danio_rerio:TR0000000002_F2\n");
}

#[test]
fn test_precomputed_report_skips_the_backend() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture(dir.path(), "out");
    config.hits = Some(write_file(
        dir.path(),
        "precomputed.tsv",
        "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n",
    ));

    let summary = run(&config, &UnreachableAligner).unwrap();
    assert!(matches!(summary, PipelineSummary::Completed { .. }));
}

#[test]
fn test_duplicate_target_aborts_before_classification() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture(dir.path(), "out");
    config.family_map = write_file(dir.path(), "dup_map.tsv", "T1\tF1\nT1\tF2\n");

    let err = run(&config, &UnreachableAligner).unwrap_err();
    assert!(matches!(err, FamsortError::DuplicateTarget { target } if target == "T1"));
}

#[test]
fn test_unmapped_target_classified_into_singleton_family() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture(dir.path(), "out");
    // map only covers T1; T2 becomes its own family
    config.family_map = write_file(dir.path(), "partial_map.tsv", "T1\tF1\n");
    let backend = CannedAligner {
        report: "Q2\tT2\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t185\n".to_string(),
    };

    run(&config, &backend).unwrap();

    let content = fs::read_to_string(family_file(&config, "T2")).unwrap();
    assert_eq!(content, ">TR0000000001_T2\nTTGACAGGTA\n");
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let dir = TempDir::new().unwrap();
    let report = "Q1\tT1\t100\t100\t0\t0\t1\t100\t1\t100\t1e-50\t190\n\
                  Q2\tT2\t100\t100\t0\t0\t1\t100\t100\t1\t1e-50\t185\n"
        .to_string();

    let config_a = fixture(dir.path(), "run_a");
    run(
        &config_a,
        &CannedAligner {
            report: report.clone(),
        },
    )
    .unwrap();

    let config_b = fixture(dir.path(), "run_b");
    run(&config_b, &CannedAligner { report }).unwrap();

    for family in ["F1", "F2"] {
        let a = fs::read(family_file(&config_a, family)).unwrap();
        let b = fs::read(family_file(&config_b, family)).unwrap();
        assert_eq!(a, b, "family {family} output differs between runs");
    }
}
