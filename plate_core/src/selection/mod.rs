//! # Combination Selection
//!
//! Per segment, the selection pipeline is:
//!
//! 1. [`generator`] enumerates every (web, flange) pair in library order
//! 2. [`weight`] computes the steel weight of the pair over the segment length
//! 3. [`rules`] evaluates the active rules without short-circuiting
//! 4. [`ranker`] keeps the lightest feasible candidate
//!
//! Candidates are built lazily and borrow their plates from the library, so a
//! segment never holds the whole search space in memory.
//!
//! ## Example
//!
//! ```rust
//! use plate_core::code_limits::CodeLimits;
//! use plate_core::config::{Config, DepthRange};
//! use plate_core::library::PlateLibrary;
//! use plate_core::member::{FrameType, Member};
//! use plate_core::segments::SegmentBuilder;
//! use plate_core::selection::{select_segment, rules::RuleEngine};
//!
//! let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[(10.0, 150.0), (12.0, 150.0)]).unwrap();
//! let config = Config::default().with_depth_range(FrameType::ClearSpan, DepthRange::new(0.0, 100.0));
//! let limits = CodeLimits::new();
//! let engine = RuleEngine::new(&config, &limits);
//!
//! let member = Member::new("M1", 6.0, FrameType::ClearSpan);
//! let segments = SegmentBuilder::new(&config).build(&member).unwrap();
//!
//! let ranked = select_segment(&segments[0], &library, &engine);
//! let winner = ranked.winner.unwrap();
//! assert_eq!(winner.flange.thickness_mm, 10.0);
//! assert!((winner.weight_kg - 146.01).abs() < 1e-9);
//! ```

pub mod generator;
pub mod ranker;
pub mod rules;
pub mod weight;

use serde::Serialize;

use crate::library::{Plate, PlateLibrary};
use crate::segments::Segment;

pub use generator::CombinationGenerator;
pub use ranker::{rank, RankedSelection};
pub use rules::{RuleEngine, RuleKind, RuleResult};

/// A (web, flange) pair evaluated for one segment
#[derive(Debug, Clone, Serialize)]
pub struct Candidate<'a> {
    pub segment: &'a Segment,
    pub web: &'a Plate,
    pub flange: &'a Plate,

    /// Steel weight over the segment length (kg), unrounded
    pub weight_kg: f64,

    /// One result per active rule, in rule order
    pub rule_results: Vec<RuleResult>,
}

impl<'a> Candidate<'a> {
    /// Weigh and check a pair for `segment`
    pub fn evaluate(segment: &'a Segment, web: &'a Plate, flange: &'a Plate, engine: &RuleEngine<'_>) -> Self {
        Candidate {
            segment,
            web,
            flange,
            weight_kg: weight::weight_kg(web, flange, segment.length_m),
            rule_results: engine.evaluate(segment, web, flange),
        }
    }

    /// True when every rule passed
    pub fn is_feasible(&self) -> bool {
        rules::is_feasible(&self.rule_results)
    }

    /// Code-check summary of this candidate
    pub fn code_check_status(&self) -> String {
        rules::code_check_status(&self.rule_results)
    }

    /// Result of a given rule, if it was active
    pub fn rule_result(&self, kind: RuleKind) -> Option<&RuleResult> {
        self.rule_results.iter().find(|r| r.rule == kind)
    }
}

/// Select the lightest feasible combination for one segment
pub fn select_segment<'a>(
    segment: &'a Segment,
    library: &'a PlateLibrary,
    engine: &RuleEngine<'_>,
) -> RankedSelection<'a> {
    let candidates = CombinationGenerator::new(library)
        .for_segment(segment)
        .map(|(web, flange)| Candidate::evaluate(segment, web, flange, engine));

    let ranked = rank(segment, candidates);

    match &ranked.winner {
        Some(winner) => tracing::debug!(
            segment = %segment.mark(),
            web = %winner.web.designation(),
            flange = %winner.flange.designation(),
            weight_kg = winner.weight_kg,
            feasible = ranked.feasible_count,
            considered = ranked.considered_count,
            "selected combination"
        ),
        None => tracing::warn!(
            segment = %segment.mark(),
            considered = ranked.considered_count,
            dominant = ?ranked.dominant_failure(),
            failures = ?ranked.failure_tally,
            "no feasible combination"
        ),
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_limits::CodeLimits;
    use crate::config::{Config, DepthModel, DepthRange, FeatureFlags};
    use crate::member::FrameType;

    fn segment(length_m: f64) -> Segment {
        Segment {
            member_id: "M1".to_string(),
            index: 1,
            start_m: 0.0,
            length_m,
            member_length_m: length_m,
            frame_type: FrameType::ClearSpan,
            design_code: None,
        }
    }

    fn config(min_mm: f64, max_mm: f64) -> Config {
        Config::default().with_depth_range(FrameType::ClearSpan, DepthRange::new(min_mm, max_mm))
    }

    #[test]
    fn test_thinner_flange_wins() {
        let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[(10.0, 150.0), (12.0, 150.0)]).unwrap();
        let config = config(0.0, 100.0);
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(6.0);

        let ranked = select_segment(&seg, &library, &engine);
        assert_eq!(ranked.considered_count, 2);
        assert_eq!(ranked.feasible_count, 2);

        let winner = ranked.winner.unwrap();
        assert_eq!(winner.web.source_index, 0);
        assert_eq!(winner.flange.source_index, 0);
        assert!((winner.weight_kg - 146.01).abs() < 1e-9);
        assert_eq!(winner.code_check_status(), rules::NOT_EVALUATED);
        assert!(winner.rule_result(RuleKind::DepthRange).unwrap().passed);
    }

    #[test]
    fn test_depth_check_disabled() {
        let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[(10.0, 150.0), (12.0, 150.0)]).unwrap();
        let config = Config::default().with_flags(FeatureFlags {
            enable_depth_range: false,
            ..FeatureFlags::default()
        });
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(6.0);

        let ranked = select_segment(&seg, &library, &engine);
        assert_eq!(ranked.considered_count, 2);
        let winner = ranked.winner.unwrap();
        assert_eq!(winner.flange.thickness_mm, 10.0);
        assert!((winner.weight_kg - (0.008 * 0.2 + 0.010 * 0.15) * 7850.0 * 6.0).abs() < 1e-9);
        assert!(winner.rule_result(RuleKind::DepthRange).is_none());
    }

    #[test]
    fn test_empty_flange_table_has_no_winner() {
        let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[]).unwrap();
        let config = config(0.0, 100.0);
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(6.0);

        let ranked = select_segment(&seg, &library, &engine);
        assert!(ranked.winner.is_none());
        assert_eq!(ranked.considered_count, 0);
    }

    #[test]
    fn test_all_outside_depth_range() {
        let library =
            PlateLibrary::from_dimensions(&[(8.0, 200.0), (10.0, 250.0)], &[(10.0, 150.0), (12.0, 150.0)]).unwrap();
        let config = config(300.0, 1200.0);
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(6.0);

        let ranked = select_segment(&seg, &library, &engine);
        assert!(ranked.winner.is_none());
        assert_eq!(ranked.considered_count, 4);
        assert_eq!(ranked.feasible_count, 0);
        assert_eq!(ranked.failure_tally.get("depth_range_check"), Some(&4));
    }

    #[test]
    fn test_depth_filter_prefers_lightest_in_range() {
        // Section model: 200 + 20 = 220 (out), 400 + 20 = 420 (in), 500 + 20 = 520 (in)
        let library =
            PlateLibrary::from_dimensions(&[(6.0, 200.0), (10.0, 500.0), (8.0, 400.0)], &[(10.0, 150.0)]).unwrap();
        let config = config(300.0, 1200.0).with_depth_model(DepthModel::Section);
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(8.0);

        let ranked = select_segment(&seg, &library, &engine);
        let winner = ranked.winner.unwrap();
        assert_eq!(winner.web.source_index, 2);
        assert_eq!(ranked.feasible_count, 2);
    }

    #[test]
    fn test_lighter_web_wins_on_short_segment() {
        // 0.001 m: 0.024335 kg against 0.0243349215 kg
        let library = PlateLibrary::from_dimensions(&[(8.0, 200.0), (10.0, 159.999)], &[(10.0, 150.0)]).unwrap();
        let config = Config::default().with_flags(FeatureFlags::none());
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(0.001);

        let ranked = select_segment(&seg, &library, &engine);
        let winner = ranked.winner.unwrap();
        assert_eq!(winner.web.source_index, 1);
        assert!(winner.weight_kg < 0.024335);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let library = PlateLibrary::from_dimensions(
            &[(8.0, 200.0), (8.0, 200.0), (6.0, 250.0)],
            &[(10.0, 150.0), (12.0, 125.0)],
        )
        .unwrap();
        let config = config(0.0, 100.0);
        let limits = CodeLimits::new();
        let engine = RuleEngine::new(&config, &limits);
        let seg = segment(7.5);

        let first = select_segment(&seg, &library, &engine).winner.unwrap();
        let second = select_segment(&seg, &library, &engine).winner.unwrap();
        assert_eq!(
            (first.web.source_index, first.flange.source_index),
            (second.web.source_index, second.flange.source_index)
        );
    }
}
