//! Ranker: picks the lightest feasible candidate of a segment.
//!
//! Ordering key is (weight, web source index, flange source index). Weights
//! within a relative [`WEIGHT_TIE_TOLERANCE`] of each other count as equal,
//! so float noise from the area and length products cannot reorder
//! candidates that weigh the same. The tolerance is relative, so the outcome
//! does not depend on segment length: a 1 mm segment ranks plates the same
//! way a 6 m segment does.
//!
//! Infeasible candidates never win. Their failed rules are tallied so a
//! segment with no winner can still say why.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::Candidate;
use crate::segments::Segment;

/// Relative weight difference below which two candidates tie
pub const WEIGHT_TIE_TOLERANCE: f64 = 1e-12;

/// Outcome of ranking one segment's candidates
#[derive(Debug, Clone, Serialize)]
pub struct RankedSelection<'a> {
    pub segment: &'a Segment,

    /// Lightest feasible candidate, `None` when nothing is feasible
    pub winner: Option<Candidate<'a>>,

    /// Candidates examined
    pub considered_count: usize,

    /// Candidates that passed every hard rule
    pub feasible_count: usize,

    /// Failures per rule name across all infeasible candidates
    pub failure_tally: BTreeMap<&'static str, usize>,
}

impl RankedSelection<'_> {
    pub fn is_feasible(&self) -> bool {
        self.winner.is_some()
    }

    /// Rule with the most failures, ties broken by rule name
    pub fn dominant_failure(&self) -> Option<(&'static str, usize)> {
        self.failure_tally
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (*name, *count))
    }
}

/// Weight order with ties inside the relative tolerance
fn compare_weight(a: f64, b: f64) -> Ordering {
    let scale = a.abs().max(b.abs());
    if (a - b).abs() <= scale * WEIGHT_TIE_TOLERANCE {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Candidate order: lighter first, then lower web index, then lower flange
/// index
pub fn compare(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    compare_weight(a.weight_kg, b.weight_kg)
        .then_with(|| a.web.source_index.cmp(&b.web.source_index))
        .then_with(|| a.flange.source_index.cmp(&b.flange.source_index))
}

/// Rank candidates of `segment` and keep the winner
pub fn rank<'a, I>(segment: &'a Segment, candidates: I) -> RankedSelection<'a>
where
    I: IntoIterator<Item = Candidate<'a>>,
{
    let mut winner: Option<Candidate<'a>> = None;
    let mut considered_count = 0;
    let mut feasible_count = 0;
    let mut failure_tally: BTreeMap<&'static str, usize> = BTreeMap::new();

    for candidate in candidates {
        considered_count += 1;

        if !candidate.is_feasible() {
            for failed in candidate.rule_results.iter().filter(|r| !r.passed) {
                *failure_tally.entry(failed.rule.name()).or_insert(0) += 1;
            }
            continue;
        }

        feasible_count += 1;
        let better = match &winner {
            Some(best) => compare(&candidate, best) == Ordering::Less,
            None => true,
        };
        if better {
            winner = Some(candidate);
        }
    }

    RankedSelection {
        segment,
        winner,
        considered_count,
        feasible_count,
        failure_tally,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Plate, PlateKind};
    use crate::member::FrameType;
    use crate::selection::rules::{RuleKind, RuleResult};

    fn segment() -> Segment {
        Segment {
            member_id: "M1".to_string(),
            index: 1,
            start_m: 0.0,
            length_m: 6.0,
            member_length_m: 6.0,
            frame_type: FrameType::ClearSpan,
            design_code: None,
        }
    }

    fn plates() -> (Vec<Plate>, Vec<Plate>) {
        let webs = (0..3)
            .map(|i| Plate::new(PlateKind::Web, 8.0, 200.0, i).unwrap())
            .collect();
        let flanges = (0..3)
            .map(|i| Plate::new(PlateKind::Flange, 10.0, 150.0, i).unwrap())
            .collect();
        (webs, flanges)
    }

    fn candidate<'a>(seg: &'a Segment, web: &'a Plate, flange: &'a Plate, weight_kg: f64, ok: bool) -> Candidate<'a> {
        let rule_results = vec![RuleResult {
            rule: RuleKind::DepthRange,
            passed: ok,
            evaluated: true,
            detail: String::new(),
        }];
        Candidate {
            segment: seg,
            web,
            flange,
            weight_kg,
            rule_results,
        }
    }

    #[test]
    fn test_lightest_feasible_wins() {
        let seg = segment();
        let (webs, flanges) = plates();
        let ranked = rank(
            &seg,
            vec![
                candidate(&seg, &webs[0], &flanges[0], 150.0, true),
                candidate(&seg, &webs[0], &flanges[1], 90.0, false),
                candidate(&seg, &webs[1], &flanges[0], 120.0, true),
            ],
        );
        let winner = ranked.winner.as_ref().unwrap();
        assert_eq!(winner.weight_kg, 120.0);
        assert_eq!(ranked.considered_count, 3);
        assert_eq!(ranked.feasible_count, 2);
        assert_eq!(ranked.failure_tally.get("depth_range_check"), Some(&1));
    }

    #[test]
    fn test_ties_break_on_web_then_flange_index() {
        let seg = segment();
        let (webs, flanges) = plates();
        // Float noise below the tolerance counts as a tie
        let ranked = rank(
            &seg,
            vec![
                candidate(&seg, &webs[2], &flanges[0], 100.0, true),
                candidate(&seg, &webs[1], &flanges[2], 100.0 + 1e-13, true),
                candidate(&seg, &webs[1], &flanges[1], 100.0, true),
            ],
        );
        let winner = ranked.winner.unwrap();
        assert_eq!(winner.web.source_index, 1);
        assert_eq!(winner.flange.source_index, 1);
    }

    #[test]
    fn test_tiny_weights_still_ordered() {
        let seg = segment();
        let (webs, flanges) = plates();
        // 1 mm segment: the two candidates differ by under 1e-6 kg
        let ranked = rank(
            &seg,
            vec![
                candidate(&seg, &webs[0], &flanges[0], 0.024335, true),
                candidate(&seg, &webs[1], &flanges[0], 0.0243349215, true),
            ],
        );
        assert_eq!(ranked.winner.unwrap().web.source_index, 1);
    }

    #[test]
    fn test_compare_weight() {
        assert_eq!(compare_weight(1.0, 1.0 + 1e-15), Ordering::Equal);
        assert_eq!(compare_weight(1e-3, 1.0000001e-3), Ordering::Less);
        assert_eq!(compare_weight(5.0, 4.0), Ordering::Greater);
        assert_eq!(compare_weight(0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn test_ranking_is_order_independent() {
        let seg = segment();
        let (webs, flanges) = plates();
        let build = || {
            vec![
                candidate(&seg, &webs[0], &flanges[2], 80.0, true),
                candidate(&seg, &webs[2], &flanges[0], 80.0, true),
                candidate(&seg, &webs[1], &flanges[1], 95.0, true),
            ]
        };
        let forward = rank(&seg, build()).winner.unwrap();
        let mut reversed = build();
        reversed.reverse();
        let backward = rank(&seg, reversed).winner.unwrap();
        assert_eq!(
            (forward.web.source_index, forward.flange.source_index),
            (backward.web.source_index, backward.flange.source_index)
        );
        assert_eq!(forward.web.source_index, 0);
    }

    #[test]
    fn test_nothing_feasible() {
        let seg = segment();
        let (webs, flanges) = plates();
        let ranked = rank(
            &seg,
            vec![
                candidate(&seg, &webs[0], &flanges[0], 50.0, false),
                candidate(&seg, &webs[1], &flanges[0], 60.0, false),
            ],
        );
        assert!(!ranked.is_feasible());
        assert_eq!(ranked.feasible_count, 0);
        assert_eq!(ranked.dominant_failure(), Some(("depth_range_check", 2)));
    }

    #[test]
    fn test_no_candidates() {
        let seg = segment();
        let ranked = rank(&seg, Vec::new());
        assert!(ranked.winner.is_none());
        assert_eq!(ranked.considered_count, 0);
        assert!(ranked.dominant_failure().is_none());
    }
}
