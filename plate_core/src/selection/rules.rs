//! # Rule Engine
//!
//! Evaluates a (web, flange) combination for one segment against the active
//! rules. The rule set is closed and fixed in order; each rule is switched on
//! or off by a feature flag, and the descriptor list is built once from the
//! config at the start of a run.
//!
//! Every active rule runs, even after an earlier failure, so the report can
//! show all failure reasons. A combination is feasible when no rule reports
//! `passed = false`.
//!
//! | Rule                  | Flag                   | Blocks selection               |
//! |-----------------------|------------------------|--------------------------------|
//! | `min_thickness_check` | `enable_min_thickness` | yes                            |
//! | `depth_range_check`   | `enable_depth_range`   | yes                            |
//! | `flange_bt_check`     | `enable_code_limits`   | only when `flange_bt_max` set  |
//! | `web_dt_check`        | `enable_code_limits`   | only when `web_dt_max` set     |
//! | `gamma_factor_check`  | `enable_code_limits`   | never                          |
//! | `bending_check`       | `enable_bending_check` | never (placeholder)            |

use serde::{Deserialize, Serialize};

use crate::code_limits::{CodeLimitSet, CodeLimits};
use crate::config::Config;
use crate::library::Plate;
use crate::segments::Segment;

/// Status text of a rule that did not check anything
pub const NOT_EVALUATED: &str = "Not evaluated";

/// Detail text of the bending placeholder
pub const PLACEHOLDER: &str = "placeholder";

/// Tolerance on ratio and thickness comparisons
const RATIO_TOLERANCE: f64 = 1e-9;

/// The closed set of rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "min_thickness_check")]
    MinThickness,
    #[serde(rename = "depth_range_check")]
    DepthRange,
    #[serde(rename = "flange_bt_check")]
    FlangeSlenderness,
    #[serde(rename = "web_dt_check")]
    WebSlenderness,
    #[serde(rename = "gamma_factor_check")]
    GammaFactors,
    #[serde(rename = "bending_check")]
    Bending,
}

impl RuleKind {
    /// All rules in evaluation order
    pub const ALL: [RuleKind; 6] = [
        RuleKind::MinThickness,
        RuleKind::DepthRange,
        RuleKind::FlangeSlenderness,
        RuleKind::WebSlenderness,
        RuleKind::GammaFactors,
        RuleKind::Bending,
    ];

    /// Rule name as reported
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::MinThickness => "min_thickness_check",
            RuleKind::DepthRange => "depth_range_check",
            RuleKind::FlangeSlenderness => "flange_bt_check",
            RuleKind::WebSlenderness => "web_dt_check",
            RuleKind::GammaFactors => "gamma_factor_check",
            RuleKind::Bending => "bending_check",
        }
    }

    /// Rules standing in for design-code checks
    pub fn is_code_check(&self) -> bool {
        matches!(
            self,
            RuleKind::FlangeSlenderness | RuleKind::WebSlenderness | RuleKind::GammaFactors | RuleKind::Bending
        )
    }

    /// Code rules that compare against a populated limit
    pub fn is_limit_check(&self) -> bool {
        matches!(self, RuleKind::FlangeSlenderness | RuleKind::WebSlenderness)
    }

    fn enabled_by(&self, config: &Config) -> bool {
        let flags = &config.feature_flags;
        match self {
            RuleKind::MinThickness => flags.enable_min_thickness,
            RuleKind::DepthRange => flags.enable_depth_range,
            RuleKind::FlangeSlenderness | RuleKind::WebSlenderness | RuleKind::GammaFactors => {
                flags.enable_code_limits
            }
            RuleKind::Bending => flags.enable_bending_check,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A rule and whether its flag is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub kind: RuleKind,
    pub enabled: bool,
}

/// Outcome of one rule for one combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: RuleKind,

    /// False only for a hard failure
    pub passed: bool,

    /// False when the rule had nothing real to check against
    pub evaluated: bool,

    pub detail: String,
}

impl RuleResult {
    fn pass(rule: RuleKind, detail: String) -> Self {
        RuleResult {
            rule,
            passed: true,
            evaluated: true,
            detail,
        }
    }

    fn fail(rule: RuleKind, detail: String) -> Self {
        RuleResult {
            rule,
            passed: false,
            evaluated: true,
            detail,
        }
    }

    fn check(rule: RuleKind, passed: bool, detail: String) -> Self {
        if passed {
            Self::pass(rule, detail)
        } else {
            Self::fail(rule, detail)
        }
    }

    fn not_evaluated(rule: RuleKind, detail: impl Into<String>) -> Self {
        RuleResult {
            rule,
            passed: true,
            evaluated: false,
            detail: detail.into(),
        }
    }

    /// "Not evaluated" for skipped checks, "Pass"/"Fail" otherwise
    pub fn status(&self) -> &'static str {
        match (self.evaluated, self.passed) {
            (false, _) => NOT_EVALUATED,
            (true, true) => "Pass",
            (true, false) => "Fail",
        }
    }
}

/// True when no rule reports a hard failure
pub fn is_feasible(results: &[RuleResult]) -> bool {
    results.iter().all(|r| r.passed)
}

/// Summary of the code-check rules of a combination.
///
/// Only the ratio limit checks count here; gamma factors and bending never
/// evaluate. "Checked" when every active limit check evaluated, "Not
/// evaluated" when none did, and "Partially checked (...)" naming the
/// evaluated rules otherwise.
pub fn code_check_status(results: &[RuleResult]) -> String {
    let code: Vec<&RuleResult> = results.iter().filter(|r| r.rule.is_limit_check()).collect();
    let evaluated: Vec<&'static str> = code.iter().filter(|r| r.evaluated).map(|r| r.rule.name()).collect();

    if evaluated.is_empty() {
        NOT_EVALUATED.to_string()
    } else if evaluated.len() == code.len() {
        "Checked".to_string()
    } else {
        format!("Partially checked ({})", evaluated.join(", "))
    }
}

/// Evaluates combinations against the active rules
#[derive(Debug, Clone)]
pub struct RuleEngine<'a> {
    descriptors: Vec<RuleDescriptor>,
    config: &'a Config,
    limits: &'a CodeLimits,
}

impl<'a> RuleEngine<'a> {
    /// Build the descriptor list from the config's feature flags
    pub fn new(config: &'a Config, limits: &'a CodeLimits) -> Self {
        let descriptors = RuleKind::ALL
            .into_iter()
            .map(|kind| RuleDescriptor {
                kind,
                enabled: kind.enabled_by(config),
            })
            .collect();
        RuleEngine {
            descriptors,
            config,
            limits,
        }
    }

    /// All descriptors, enabled or not, in evaluation order
    pub fn descriptors(&self) -> &[RuleDescriptor] {
        &self.descriptors
    }

    /// Enabled rules in evaluation order
    pub fn active_rules(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.descriptors.iter().filter(|d| d.enabled).map(|d| d.kind)
    }

    /// Run every active rule; no short-circuit
    pub fn evaluate(&self, segment: &Segment, web: &Plate, flange: &Plate) -> Vec<RuleResult> {
        let limits = self.limits.for_code(segment.design_code);
        self.active_rules()
            .map(|kind| self.evaluate_rule(kind, segment, &limits, web, flange))
            .collect()
    }

    fn evaluate_rule(
        &self,
        kind: RuleKind,
        segment: &Segment,
        limits: &CodeLimitSet,
        web: &Plate,
        flange: &Plate,
    ) -> RuleResult {
        match kind {
            RuleKind::MinThickness => {
                let min = &self.config.min_thickness;
                let web_ok = web.thickness_mm + RATIO_TOLERANCE >= min.web_mm;
                let flange_ok = flange.thickness_mm + RATIO_TOLERANCE >= min.flange_mm;
                RuleResult::check(
                    kind,
                    web_ok && flange_ok,
                    format!(
                        "web {} mm (min {}), flange {} mm (min {})",
                        web.thickness_mm, min.web_mm, flange.thickness_mm, min.flange_mm
                    ),
                )
            }
            RuleKind::DepthRange => {
                let depth = self.config.depth_model.depth_mm(web, flange);
                match self.config.depth_range_for(segment.frame_type, segment.member_length_m) {
                    Some(range) => {
                        let inside = range.contains(depth);
                        let relation = if inside { "within" } else { "outside" };
                        RuleResult::check(kind, inside, format!("depth {:.1} mm {} {}", depth, relation, range))
                    }
                    None => RuleResult::fail(
                        kind,
                        format!("no depth range configured for {}", segment.frame_type),
                    ),
                }
            }
            RuleKind::FlangeSlenderness => ratio_check(kind, "flange b/t", flange.slenderness(), limits.flange_bt_max),
            RuleKind::WebSlenderness => ratio_check(kind, "web d/t", web.slenderness(), limits.web_dt_max),
            RuleKind::GammaFactors => match (limits.gamma_m0, limits.gamma_m1) {
                (None, None) => RuleResult::not_evaluated(kind, NOT_EVALUATED),
                (m0, m1) => RuleResult::not_evaluated(
                    kind,
                    format!(
                        "{} (gamma_m0={}, gamma_m1={}; no capacity check performed)",
                        NOT_EVALUATED,
                        fmt_opt(m0),
                        fmt_opt(m1)
                    ),
                ),
            },
            RuleKind::Bending => RuleResult::not_evaluated(kind, PLACEHOLDER),
        }
    }
}

fn ratio_check(kind: RuleKind, label: &str, ratio: f64, limit: Option<f64>) -> RuleResult {
    match limit {
        None => RuleResult::not_evaluated(kind, NOT_EVALUATED),
        Some(max) => {
            let ok = ratio <= max + RATIO_TOLERANCE;
            let relation = if ok { "<=" } else { ">" };
            RuleResult::check(kind, ok, format!("{} {:.2} {} {:.2}", label, ratio, relation, max))
        }
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}
