//! # Run Configuration
//!
//! Feature flags, frame-type depth ranges, depth model and the segment rule.
//! The config is loaded once per run, validated, and then passed by
//! reference to the segment builder and the rule engine. Nothing in the core
//! reads configuration from global state.
//!
//! ## YAML Example
//!
//! ```yaml
//! feature_flags:
//!   enable_depth_range: true
//!   enable_bending_check: true
//!   enable_code_limits: true
//!   enable_min_thickness: false
//! depth_model: section
//! frame_types:
//!   ClearSpan: { min_mm: 300, max_mm: 1200 }
//!   MultiSpan: { min_mm: 250, max_mm: 900 }
//! segment_rule: by_bay_spacing
//! bay_spacing_m: 6.0
//! splice_limit_m: 7.0
//! span_widening:
//!   - { min_span_m: 40.0, max_mm: 1400 }
//!   - { min_span_m: 60.0, max_mm: 1600 }
//! min_thickness:
//!   web_mm: 4.0
//!   flange_mm: 6.0
//! ```
//!
//! JSON documents with the same shape are accepted as well; the format is
//! chosen from the file extension. Unknown keys are rejected.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PlateError, PlateResult};
use crate::library::Plate;
use crate::member::FrameType;

/// Boolean switches for the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureFlags {
    /// Enforce the frame-type depth range (hard rule)
    pub enable_depth_range: bool,

    /// Report the bending placeholder check
    pub enable_bending_check: bool,

    /// Evaluate b/t, d/t and gamma limits from the code-limits table
    #[serde(alias = "enable_bt_limits")]
    pub enable_code_limits: bool,

    /// Enforce minimum plate thicknesses (hard rule)
    pub enable_min_thickness: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags {
            enable_depth_range: true,
            enable_bending_check: true,
            enable_code_limits: true,
            enable_min_thickness: false,
        }
    }
}

impl FeatureFlags {
    /// All flags off
    pub fn none() -> Self {
        FeatureFlags {
            enable_depth_range: false,
            enable_bending_check: false,
            enable_code_limits: false,
            enable_min_thickness: false,
        }
    }
}

/// Inclusive allowed depth range (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepthRange {
    pub min_mm: f64,
    pub max_mm: f64,
}

impl DepthRange {
    pub fn new(min_mm: f64, max_mm: f64) -> Self {
        DepthRange { min_mm, max_mm }
    }

    /// True when `depth_mm` lies within [min, max]
    pub fn contains(&self, depth_mm: f64) -> bool {
        self.min_mm <= depth_mm && depth_mm <= self.max_mm
    }
}

/// Raise the depth ceiling of members longer than `min_span_m`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpanWidening {
    pub min_span_m: f64,
    pub max_mm: f64,
}

impl SpanWidening {
    pub fn new(min_span_m: f64, max_mm: f64) -> Self {
        SpanWidening { min_span_m, max_mm }
    }
}

fn default_span_widening() -> Vec<SpanWidening> {
    vec![SpanWidening::new(40.0, 1400.0), SpanWidening::new(60.0, 1600.0)]
}

impl std::fmt::Display for DepthRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.1}, {:.1}] mm", self.min_mm, self.max_mm)
    }
}

/// How the effective depth of a (web, flange) combination is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthModel {
    /// Web thickness + flange thickness
    #[default]
    Sum,
    /// Larger of web thickness and flange thickness
    Max,
    /// Web width (web depth) + 2 x flange thickness
    Section,
}

impl DepthModel {
    /// Effective depth (mm) of a combination under this model
    pub fn depth_mm(&self, web: &Plate, flange: &Plate) -> f64 {
        match self {
            DepthModel::Sum => web.thickness_mm + flange.thickness_mm,
            DepthModel::Max => web.thickness_mm.max(flange.thickness_mm),
            DepthModel::Section => web.width_mm + 2.0 * flange.thickness_mm,
        }
    }
}

/// How a member is cut into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRule {
    /// One segment over the full member length
    #[default]
    Uniform,
    /// Segments aligned to bay boundaries
    ByBaySpacing,
}

/// Minimum plate thicknesses for `min_thickness_check`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinThickness {
    pub web_mm: f64,
    pub flange_mm: f64,
}

impl Default for MinThickness {
    fn default() -> Self {
        MinThickness {
            web_mm: 4.0,
            flange_mm: 6.0,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub feature_flags: FeatureFlags,

    #[serde(default)]
    pub depth_model: DepthModel,

    /// Allowed depth range per frame type
    #[serde(default)]
    pub frame_types: BTreeMap<FrameType, DepthRange>,

    #[serde(default)]
    pub segment_rule: SegmentRule,

    /// Default uniform bay spacing (m) when a member carries none
    #[serde(default)]
    pub bay_spacing_m: Option<f64>,

    /// Longest fabricated piece (m); longer segments are split
    #[serde(default)]
    pub splice_limit_m: Option<f64>,

    /// Span-dependent depth ceilings, applied in order
    #[serde(default = "default_span_widening")]
    pub span_widening: Vec<SpanWidening>,

    #[serde(default)]
    pub min_thickness: MinThickness,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feature_flags: FeatureFlags::default(),
            depth_model: DepthModel::default(),
            frame_types: BTreeMap::new(),
            segment_rule: SegmentRule::default(),
            bay_spacing_m: None,
            splice_limit_m: None,
            span_widening: default_span_widening(),
            min_thickness: MinThickness::default(),
        }
    }
}

impl Config {
    /// Load and validate a config file (`.yaml`, `.yml` or `.json`)
    pub fn load(path: &Path) -> PlateResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PlateError::file_error("read config", path.display().to_string(), e.to_string()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config = match ext.as_str() {
            "json" => Self::from_json_str(&contents)?,
            "yaml" | "yml" => Self::from_yaml_str(&contents)?,
            other => {
                return Err(PlateError::config(
                    "path",
                    format!("unsupported config format '{}', expected .yaml, .yml or .json", other),
                ))
            }
        };

        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(s: &str) -> PlateResult<Self> {
        let config: Config = serde_yaml::from_str(s).map_err(|e| PlateError::config("document", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(s: &str) -> PlateResult<Self> {
        let config: Config = serde_json::from_str(s).map_err(|e| PlateError::config("document", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject contradictory or out-of-range values
    pub fn validate(&self) -> PlateResult<()> {
        for (frame_type, range) in &self.frame_types {
            let key = format!("frame_types.{}", frame_type);
            if !range.min_mm.is_finite() || !range.max_mm.is_finite() || range.min_mm < 0.0 {
                return Err(PlateError::config(
                    key,
                    format!("depth range {} must be finite and non-negative", range),
                ));
            }
            if range.min_mm > range.max_mm {
                return Err(PlateError::config(
                    key,
                    format!("min_mm {} is greater than max_mm {}", range.min_mm, range.max_mm),
                ));
            }
        }

        if let Some(bay) = self.bay_spacing_m {
            if !bay.is_finite() || bay <= 0.0 {
                return Err(PlateError::config(
                    "bay_spacing_m",
                    format!("bay spacing must be positive, got {}", bay),
                ));
            }
        }

        if let Some(limit) = self.splice_limit_m {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(PlateError::config(
                    "splice_limit_m",
                    format!("splice limit must be positive, got {}", limit),
                ));
            }
        }

        for (i, widening) in self.span_widening.iter().enumerate() {
            if !widening.min_span_m.is_finite()
                || widening.min_span_m < 0.0
                || !widening.max_mm.is_finite()
                || widening.max_mm <= 0.0
            {
                return Err(PlateError::config(
                    format!("span_widening[{}]", i),
                    format!(
                        "min_span_m {} and max_mm {} must be finite, max_mm positive",
                        widening.min_span_m, widening.max_mm
                    ),
                ));
            }
        }

        for (key, value) in [
            ("min_thickness.web_mm", self.min_thickness.web_mm),
            ("min_thickness.flange_mm", self.min_thickness.flange_mm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlateError::config(key, format!("must be positive, got {}", value)));
            }
        }

        Ok(())
    }

    /// Depth range configured for a frame type
    pub fn depth_range(&self, frame_type: FrameType) -> Option<DepthRange> {
        self.frame_types.get(&frame_type).copied()
    }

    /// Depth range for a frame type on a member of length `span_m`
    ///
    /// Each `span_widening` entry whose `min_span_m` is exceeded raises the
    /// ceiling to at least its `max_mm`. The floor is never changed.
    pub fn depth_range_for(&self, frame_type: FrameType, span_m: f64) -> Option<DepthRange> {
        let mut range = self.depth_range(frame_type)?;
        for widening in &self.span_widening {
            if span_m > widening.min_span_m {
                range.max_mm = range.max_mm.max(widening.max_mm);
            }
        }
        Some(range)
    }

    /// Fail when the depth check is on but `frame_type` has no range
    pub fn require_depth_range(&self, frame_type: FrameType) -> PlateResult<()> {
        if self.feature_flags.enable_depth_range && self.depth_range(frame_type).is_none() {
            return Err(PlateError::config(
                format!("frame_types.{}", frame_type),
                "depth range check is enabled but no range is configured for this frame type",
            ));
        }
        Ok(())
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.feature_flags = flags;
        self
    }

    pub fn with_depth_range(mut self, frame_type: FrameType, range: DepthRange) -> Self {
        self.frame_types.insert(frame_type, range);
        self
    }

    pub fn with_depth_model(mut self, model: DepthModel) -> Self {
        self.depth_model = model;
        self
    }

    pub fn with_segment_rule(mut self, rule: SegmentRule, bay_spacing_m: Option<f64>) -> Self {
        self.segment_rule = rule;
        self.bay_spacing_m = bay_spacing_m;
        self
    }

    pub fn with_splice_limit(mut self, splice_limit_m: Option<f64>) -> Self {
        self.splice_limit_m = splice_limit_m;
        self
    }

    pub fn with_span_widening(mut self, span_widening: Vec<SpanWidening>) -> Self {
        self.span_widening = span_widening;
        self
    }
}
