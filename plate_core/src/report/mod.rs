//! # Selection Report
//!
//! Maps ranked selections to flat report rows, one per segment, and carries
//! the run metadata written to the summary sheet. Values are kept unrounded
//! here; rounding happens only when a [`writer`] formats them.
//!
//! ## Structure
//!
//! ```text
//! SelectionReport
//! ├── meta: ReportMetadata (run id, timestamp, version, library sizes)
//! └── rows: Vec<ReportRow> (one per segment, member order then segment order)
//! ```

pub mod writer;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, DepthModel, SegmentRule};
use crate::library::{Plate, PlateLibrary};
use crate::member::{DesignCode, FrameType, Member};
use crate::selection::rules::NOT_EVALUATED;
use crate::selection::{RankedSelection, RuleResult};

pub use writer::{write_report, ReportFormat};

/// Status text for segments without a winner
pub const NO_FEASIBLE: &str = "No feasible combination";

/// Fixed column order of the selection sheet
pub const REPORT_COLUMNS: [&str; 18] = [
    "Mark",
    "Member",
    "Segment",
    "Quantity",
    "Frame Type",
    "Design Code",
    "Start (m)",
    "Length (m)",
    "Web Thickness (mm)",
    "Web Width (mm)",
    "Flange Thickness (mm)",
    "Flange Width (mm)",
    "Weight (kg)",
    "Feasible",
    "Code Check",
    "Candidates Considered",
    "Feasible Candidates",
    "Notes",
];

/// Plate dimensions as reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateSpec {
    pub thickness_mm: f64,
    pub width_mm: f64,
    pub source_index: usize,
}

impl From<&Plate> for PlateSpec {
    fn from(plate: &Plate) -> Self {
        PlateSpec {
            thickness_mm: plate.thickness_mm,
            width_mm: plate.width_mm,
            source_index: plate.source_index,
        }
    }
}

/// One report row, describing one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Segment mark, e.g. "M1-2"
    pub mark: String,
    pub member_id: String,
    pub segment_index: usize,
    pub quantity: u32,
    pub frame_type: FrameType,
    pub design_code: Option<DesignCode>,
    pub start_m: f64,
    pub length_m: f64,

    /// Winning web plate, absent when nothing is feasible
    pub web: Option<PlateSpec>,
    /// Winning flange plate, absent when nothing is feasible
    pub flange: Option<PlateSpec>,
    /// Weight of one segment (kg), unrounded
    pub weight_kg: Option<f64>,

    pub feasible: bool,
    pub code_check: String,
    pub candidates_considered: usize,
    pub feasible_candidates: usize,
    pub notes: String,

    /// Rule results of the winner
    #[serde(default)]
    pub rule_results: Vec<RuleResult>,

    /// Failed-rule counts over all infeasible candidates
    #[serde(default)]
    pub failure_tally: BTreeMap<String, usize>,
}

impl ReportRow {
    /// Map a ranked segment of `member` to a report row
    pub fn from_selection(member: &Member, ranked: &RankedSelection<'_>) -> Self {
        let segment = ranked.segment;
        let winner = ranked.winner.as_ref();

        let failure_tally: BTreeMap<String, usize> = ranked
            .failure_tally
            .iter()
            .map(|(rule, count)| (rule.to_string(), *count))
            .collect();

        let (code_check, notes) = match winner {
            Some(w) => (w.code_check_status(), winner_notes(&w.rule_results)),
            None => (NO_FEASIBLE.to_string(), infeasible_notes(ranked)),
        };

        ReportRow {
            mark: segment.mark(),
            member_id: segment.member_id.clone(),
            segment_index: segment.index,
            quantity: member.quantity,
            frame_type: segment.frame_type,
            design_code: segment.design_code,
            start_m: segment.start_m,
            length_m: segment.length_m,
            web: winner.map(|w| PlateSpec::from(w.web)),
            flange: winner.map(|w| PlateSpec::from(w.flange)),
            weight_kg: winner.map(|w| w.weight_kg),
            feasible: winner.is_some(),
            code_check,
            candidates_considered: ranked.considered_count,
            feasible_candidates: ranked.feasible_count,
            notes,
            rule_results: winner.map(|w| w.rule_results.clone()).unwrap_or_default(),
            failure_tally,
        }
    }

    /// Weight of all `quantity` copies of this segment (kg)
    pub fn total_weight_kg(&self) -> f64 {
        self.weight_kg.unwrap_or(0.0) * f64::from(self.quantity)
    }
}

/// Rule details worth showing next to a winner
fn winner_notes(results: &[RuleResult]) -> String {
    results
        .iter()
        .filter(|r| r.evaluated || r.detail != NOT_EVALUATED)
        .map(|r| format!("{}: {}", r.rule.name(), r.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

fn infeasible_notes(ranked: &RankedSelection<'_>) -> String {
    if ranked.considered_count == 0 {
        return "No candidates: a plate table is empty".to_string();
    }
    let failures = ranked
        .failure_tally
        .iter()
        .map(|(rule, count)| format!("{} x{}", rule, count))
        .collect::<Vec<_>>()
        .join(", ");
    format!("All {} candidates failed: {}", ranked.considered_count, failures)
}

/// Run metadata shown on the summary sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub web_plates: usize,
    pub flange_plates: usize,
    pub depth_model: DepthModel,
    pub segment_rule: SegmentRule,
}

impl ReportMetadata {
    /// Fresh metadata for a run over `library` with `config`
    pub fn new(library: &PlateLibrary, config: &Config) -> Self {
        ReportMetadata {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            web_plates: library.webs().len(),
            flange_plates: library.flanges().len(),
            depth_model: config.depth_model,
            segment_rule: config.segment_rule,
        }
    }
}

/// Report of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub meta: ReportMetadata,
    pub rows: Vec<ReportRow>,
}

impl SelectionReport {
    pub fn new(meta: ReportMetadata) -> Self {
        SelectionReport { meta, rows: Vec::new() }
    }

    /// Append the row for one ranked segment
    pub fn push(&mut self, member: &Member, ranked: &RankedSelection<'_>) {
        self.rows.push(ReportRow::from_selection(member, ranked));
    }

    /// Distinct member ids
    pub fn member_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.member_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn segment_count(&self) -> usize {
        self.rows.len()
    }

    pub fn infeasible_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.feasible).count()
    }

    /// True when there is at least one segment and none has a winner
    pub fn all_infeasible(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| !r.feasible)
    }

    /// Steel weight over all feasible segments, quantities applied (kg)
    pub fn total_weight_kg(&self) -> f64 {
        self.rows.iter().map(ReportRow::total_weight_kg).sum()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.meta.run_id,
            members: self.member_count(),
            segments: self.segment_count(),
            infeasible_segments: self.infeasible_count(),
            total_weight_kg: writer::round_to(self.total_weight_kg(), 2),
        }
    }
}

/// Compact run outcome printed by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: Uuid,
    pub members: usize,
    pub segments: usize,
    pub infeasible_segments: usize,
    pub total_weight_kg: f64,
}
