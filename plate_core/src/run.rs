//! # Selection Run
//!
//! Drives a whole run: validate everything up front, cut every member into
//! segments, then select a combination per segment and collect the report.
//! Fatal problems (configuration, library, input rows, bay data) surface
//! before the first segment is ranked. A segment without a feasible
//! combination is not fatal; it becomes a report row with no winner.
//!
//! ## Example
//!
//! ```rust
//! use plate_core::code_limits::CodeLimits;
//! use plate_core::config::{Config, DepthRange};
//! use plate_core::library::PlateLibrary;
//! use plate_core::member::{FrameType, Member};
//! use plate_core::run::run_selection;
//!
//! let library = PlateLibrary::from_dimensions(&[(8.0, 200.0)], &[(10.0, 150.0)]).unwrap();
//! let config = Config::default().with_depth_range(FrameType::ClearSpan, DepthRange::new(0.0, 100.0));
//! let members = vec![Member::new("M1", 6.0, FrameType::ClearSpan)];
//!
//! let report = run_selection(&members, &library, &config, &CodeLimits::new()).unwrap();
//! assert_eq!(report.segment_count(), 1);
//! assert_eq!(report.infeasible_count(), 0);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::code_limits::CodeLimits;
use crate::config::Config;
use crate::errors::{PlateError, PlateResult};
use crate::io::{library::check_library, load_library, read_members};
use crate::library::PlateLibrary;
use crate::member::{FrameType, Member};
use crate::report::{ReportMetadata, SelectionReport};
use crate::segments::{Segment, SegmentBuilder};
use crate::selection::{select_segment, CombinationGenerator, RuleEngine};

/// Everything a run reads from disk
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub members: Vec<Member>,
    pub library: PlateLibrary,
    pub config: Config,
    pub limits: CodeLimits,
}

impl RunInputs {
    /// Load config, code limits, library and members, in that order.
    ///
    /// Without a code-limits file every code rule reports "Not evaluated".
    pub fn load(input: &Path, library: &Path, config: &Path, code_limits: Option<&Path>) -> PlateResult<Self> {
        let config = Config::load(config)?;
        let limits = match code_limits {
            Some(path) => CodeLimits::load(path)?,
            None => CodeLimits::new(),
        };
        let library = load_library(library)?;
        let members = read_members(input)?;
        Ok(RunInputs {
            members,
            library,
            config,
            limits,
        })
    }

    pub fn run(&self) -> PlateResult<SelectionReport> {
        run_selection(&self.members, &self.library, &self.config, &self.limits)
    }

    pub fn diagnose(&self) -> PlateResult<Vec<SegmentDiagnosis>> {
        diagnose(&self.members, &self.library, &self.config, &self.limits)
    }
}

/// Validate inputs and cut every member into segments
fn plan(
    members: &[Member],
    library: &PlateLibrary,
    config: &Config,
    limits: &CodeLimits,
) -> PlateResult<Vec<(usize, Vec<Segment>)>> {
    config.validate()?;
    limits.validate()?;
    check_library(library)?;

    let mut ids: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, member) in members.iter().enumerate() {
        if let Some(first) = ids.insert(member.member_id.as_str(), i) {
            return Err(PlateError::invalid_input(
                None,
                "member_id",
                member.member_id.clone(),
                format!("duplicate member id (members {} and {})", first + 1, i + 1),
            ));
        }
    }

    for member in members {
        config.require_depth_range(member.frame_type)?;
    }

    let builder = SegmentBuilder::new(config);
    members
        .iter()
        .enumerate()
        .map(|(i, member)| builder.build(member).map(|segments| (i, segments)))
        .collect()
}

/// Select a combination for every segment of every member
pub fn run_selection(
    members: &[Member],
    library: &PlateLibrary,
    config: &Config,
    limits: &CodeLimits,
) -> PlateResult<SelectionReport> {
    let planned = plan(members, library, config, limits)?;
    let engine = RuleEngine::new(config, limits);

    tracing::info!(
        members = members.len(),
        segments = planned.iter().map(|(_, s)| s.len()).sum::<usize>(),
        search_space = library.combination_count(),
        rules = ?rule_switches(&engine),
        "starting selection run"
    );
    if config.feature_flags.enable_code_limits && limits.is_unpopulated() {
        tracing::warn!("code limit checks are enabled but no limit is populated; they report Not evaluated");
    }

    let mut report = SelectionReport::new(ReportMetadata::new(library, config));
    for (i, segments) in &planned {
        let member = &members[*i];
        for segment in segments {
            let ranked = select_segment(segment, library, &engine);
            report.push(member, &ranked);
        }
    }

    tracing::info!(
        run_id = %report.meta.run_id,
        segments = report.segment_count(),
        infeasible = report.infeasible_count(),
        total_weight_kg = report.total_weight_kg(),
        "selection run finished"
    );
    Ok(report)
}

/// "name=on|off" for every rule in evaluation order
fn rule_switches(engine: &RuleEngine<'_>) -> Vec<String> {
    engine
        .descriptors()
        .iter()
        .map(|d| format!("{}={}", d.kind.name(), if d.enabled { "on" } else { "off" }))
        .collect()
}

/// Search statistics of one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDiagnosis {
    pub mark: String,
    pub frame_type: FrameType,
    pub length_m: f64,

    /// |web| x |flange|
    pub search_space: usize,
    pub feasible: usize,
    pub failure_tally: BTreeMap<String, usize>,

    /// Rule that rejected the most candidates
    pub dominant_failure: Option<String>,

    /// Weight of the winner, if any (kg)
    pub winner_weight_kg: Option<f64>,
}

/// Per-segment search statistics without writing a report
pub fn diagnose(
    members: &[Member],
    library: &PlateLibrary,
    config: &Config,
    limits: &CodeLimits,
) -> PlateResult<Vec<SegmentDiagnosis>> {
    let planned = plan(members, library, config, limits)?;
    let engine = RuleEngine::new(config, limits);
    let search_space = CombinationGenerator::new(library).len();

    let mut out = Vec::new();
    for (_, segments) in &planned {
        for segment in segments {
            let ranked = select_segment(segment, library, &engine);
            out.push(SegmentDiagnosis {
                mark: segment.mark(),
                frame_type: segment.frame_type,
                length_m: segment.length_m,
                search_space,
                feasible: ranked.feasible_count,
                failure_tally: ranked
                    .failure_tally
                    .iter()
                    .map(|(rule, count)| (rule.to_string(), *count))
                    .collect(),
                dominant_failure: ranked.dominant_failure().map(|(rule, _)| rule.to_string()),
                winner_weight_kg: ranked.winner.as_ref().map(|w| w.weight_kg),
            });
        }
    }
    Ok(out)
}
