//! Score-threshold confirmation.
//!
//! Normalization is per family/target pair, not per family: a query
//! hitting a weaker-scoring but still correct target within the right
//! family is not penalized against the family's strongest target.

use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;

use crate::classify::FamilyHitGroup;

/// Fraction of a target's best score a hit must reach to be retained.
/// Fixed in this design; a candidate tunable.
pub const CONFIRM_RATIO: f64 = 0.9;

/// Confirmed queries for one family.
#[derive(Debug, Default)]
pub struct FamilyAssignment {
    /// target -> retained query ids, in registration order.
    pub retained_by_target: IndexMap<String, Vec<String>>,
    /// Queries needing reverse-complement, aggregated across targets.
    pub reverse: IndexSet<String>,
}

impl FamilyAssignment {
    /// Deduplicated union of retained queries across this family's
    /// targets, each with its source target. A query retained through
    /// several targets keeps the last one seen.
    pub fn retained_union(&self) -> IndexMap<String, String> {
        let mut union = IndexMap::new();
        for (target, queries) in &self.retained_by_target {
            for query in queries {
                union.insert(query.clone(), target.clone());
            }
        }
        union
    }
}

/// family -> its confirmed assignment.
#[derive(Debug, Default)]
pub struct ConfirmedAssignment {
    pub families: IndexMap<String, FamilyAssignment>,
}

/// Retain, for every family/target pair, the queries scoring at least
/// `CONFIRM_RATIO` of that pair's best score.
pub fn confirm(groups: &FamilyHitGroup) -> ConfirmedAssignment {
    let mut confirmed = ConfirmedAssignment::default();

    for (family, targets) in &groups.families {
        let assignment = confirmed.families.entry(family.clone()).or_default();
        for (target, target_hits) in targets {
            let best = target_hits
                .scores
                .iter()
                .map(|&s| OrderedFloat(s))
                .max()
                .map(|s| s.0)
                .unwrap_or(0.0);
            let threshold = CONFIRM_RATIO * best;

            let retained = assignment
                .retained_by_target
                .entry(target.clone())
                .or_default();
            for i in 0..target_hits.queries.len() {
                if target_hits.scores[i] >= threshold {
                    retained.push(target_hits.queries[i].clone());
                    if target_hits.reverse[i] {
                        assignment.reverse.insert(target_hits.queries[i].clone());
                    }
                }
            }
        }
    }

    confirmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TargetHits;

    fn group(entries: &[(&str, &str, &[(&str, f64, bool)])]) -> FamilyHitGroup {
        let mut groups = FamilyHitGroup::default();
        for (family, target, hits) in entries {
            let target_hits = groups
                .families
                .entry(family.to_string())
                .or_default()
                .entry(target.to_string())
                .or_default();
            for (query, score, reverse) in hits.iter() {
                target_hits.queries.push(query.to_string());
                target_hits.scores.push(*score);
                target_hits.reverse.push(*reverse);
            }
        }
        groups
    }

    #[test]
    fn test_threshold_is_ninety_percent_of_target_best() {
        let groups = group(&[(
            "F1",
            "T1",
            &[("Q1", 100.0, false), ("Q2", 90.0, false), ("Q3", 89.9, false)],
        )]);

        let confirmed = confirm(&groups);
        let retained = &confirmed.families["F1"].retained_by_target["T1"];
        assert_eq!(retained, &["Q1", "Q2"]);
    }

    #[test]
    fn test_normalization_is_per_target_not_per_family() {
        // T2's best is far below T1's; its queries still pass against
        // their own target's best.
        let groups = group(&[
            ("F1", "T1", &[("Q1", 200.0, false)][..]),
            ("F1", "T2", &[("Q2", 50.0, false), ("Q3", 46.0, false)][..]),
        ]);

        let confirmed = confirm(&groups);
        let assignment = &confirmed.families["F1"];
        assert_eq!(assignment.retained_by_target["T1"], ["Q1"]);
        assert_eq!(assignment.retained_by_target["T2"], ["Q2", "Q3"]);
    }

    #[test]
    fn test_reverse_set_aggregates_across_targets() {
        let groups = group(&[
            ("F1", "T1", &[("Q1", 100.0, true)][..]),
            ("F1", "T2", &[("Q2", 80.0, true), ("Q3", 80.0, false)][..]),
        ]);

        let confirmed = confirm(&groups);
        let reverse = &confirmed.families["F1"].reverse;
        assert!(reverse.contains("Q1"));
        assert!(reverse.contains("Q2"));
        assert!(!reverse.contains("Q3"));
    }

    #[test]
    fn test_dropped_query_does_not_join_reverse_set() {
        let groups = group(&[("F1", "T1", &[("Q1", 100.0, false), ("Q2", 10.0, true)])]);

        let confirmed = confirm(&groups);
        let assignment = &confirmed.families["F1"];
        assert_eq!(assignment.retained_by_target["T1"], ["Q1"]);
        assert!(assignment.reverse.is_empty());
    }

    #[test]
    fn test_retained_union_dedupes_and_keeps_last_target() {
        let groups = group(&[
            ("F1", "T1", &[("Q1", 100.0, false)][..]),
            ("F1", "T2", &[("Q1", 100.0, false), ("Q2", 95.0, false)][..]),
        ]);

        let confirmed = confirm(&groups);
        let union = confirmed.families["F1"].retained_union();
        assert_eq!(union.len(), 2);
        assert_eq!(union["Q1"], "T2");
        assert_eq!(union["Q2"], "T2");
        // first-seen order survives the overwrite
        assert_eq!(union.keys().collect::<Vec<_>>(), ["Q1", "Q2"]);
    }
}
