//! Best-hit selection and family grouping.
//!
//! For each query the maximal-score hits are kept (ties unbroken), the
//! tied targets are mapped to families, and the query is registered
//! under every resulting family/target pair. A query whose best hits
//! span more than one family is a recorded ambiguity, not an error:
//! the heuristic deliberately does not pick a winner, so such a query
//! can end up in several family outputs.

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use crate::family_index::TargetFamilyIndex;
use crate::hits::AlignmentHit;

/// Best-hit summary for one query.
#[derive(Debug)]
pub struct QueryBest {
    pub best_score: f64,
    /// Targets achieving the best score.
    pub targets: IndexSet<String>,
    /// Distinct families of those targets.
    pub families: IndexSet<String>,
}

/// Hits routed through one target of one family. The three lists run in
/// parallel, one entry per registered query.
#[derive(Debug, Default)]
pub struct TargetHits {
    pub queries: Vec<String>,
    pub scores: Vec<f64>,
    pub reverse: Vec<bool>,
}

/// family -> target -> queries whose best hit passed through that target.
#[derive(Debug, Default)]
pub struct FamilyHitGroup {
    pub families: IndexMap<String, IndexMap<String, TargetHits>>,
}

/// Outcome of the selection pass over all queries.
#[derive(Debug, Default)]
pub struct Selection {
    pub groups: FamilyHitGroup,
    pub per_query: IndexMap<String, QueryBest>,
    /// Queries with zero hits, reported and then dropped.
    pub no_hit: Vec<String>,
    /// Queries whose best hits spanned more than one family.
    pub ambiguous: usize,
}

/// Select the best hit(s) for every query and group them by family and
/// target. `query_ids` is the full query set from the input FASTA, so
/// hitless queries are visible here.
pub fn select_best_hits(
    query_ids: &[String],
    hits: &[AlignmentHit],
    index: &TargetFamilyIndex,
) -> Selection {
    let mut by_query: IndexMap<&str, Vec<&AlignmentHit>> = IndexMap::new();
    for hit in hits {
        by_query.entry(hit.query_id.as_str()).or_default().push(hit);
    }

    let mut selection = Selection::default();
    let mut unknown_targets: IndexSet<String> = IndexSet::new();

    for query in query_ids {
        let Some(query_hits) = by_query.get(query.as_str()) else {
            selection.no_hit.push(query.clone());
            continue;
        };

        let best_score = query_hits
            .iter()
            .map(|h| OrderedFloat(h.score))
            .max()
            .map(|s| s.0)
            .unwrap_or(0.0);

        // Unique targets at the best score; orientation comes from the
        // first best hit on each target.
        let mut best_by_target: IndexMap<&str, &AlignmentHit> = IndexMap::new();
        for hit in query_hits.iter().copied().filter(|h| h.score == best_score) {
            best_by_target.entry(hit.target_id.as_str()).or_insert(hit);
        }

        let mut families = IndexSet::new();
        for (&target, &hit) in &best_by_target {
            let family = match index.family_of(target) {
                Some(family) => family,
                None => {
                    // A report target outside the reference collection;
                    // treated like an unmapped target.
                    unknown_targets.insert(target.to_string());
                    target
                }
            };
            families.insert(family.to_string());

            let target_hits = selection
                .groups
                .families
                .entry(family.to_string())
                .or_default()
                .entry(target.to_string())
                .or_default();
            target_hits.queries.push(query.clone());
            target_hits.scores.push(best_score);
            target_hits.reverse.push(hit.is_reverse());
        }

        if families.len() > 1 {
            warn!(
                "more than one family attributed to {} (score {}):\n\t- {}",
                query,
                best_score,
                families.iter().cloned().collect::<Vec<_>>().join("\n\t- ")
            );
            selection.ambiguous += 1;
        }

        let targets = best_by_target.keys().map(|t| t.to_string()).collect();
        selection.per_query.insert(
            query.clone(),
            QueryBest {
                best_score,
                targets,
                families,
            },
        );
    }

    if !unknown_targets.is_empty() {
        warn!(
            "{} report target(s) not in the reference collection, each treated as its own family: {}",
            unknown_targets.len(),
            unknown_targets
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !selection.no_hit.is_empty() {
        info!("{} queries had no hit", selection.no_hit.len());
        debug!("queries without hit: {}", selection.no_hit.join(", "));
    }

    selection
}
