//! # Members
//!
//! A member is one input row: a structural element of a given total length
//! that will be cut into segments, each receiving its own web + flange
//! combination.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PlateError, PlateResult};
use crate::segments::BayPattern;

/// Frame type of the building the member belongs to.
///
/// Each frame type maps to an allowed section depth range in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrameType {
    #[serde(alias = "clear_span")]
    ClearSpan,
    #[serde(alias = "multi_span")]
    MultiSpan,
    #[serde(alias = "multi_gable")]
    MultiGable,
    #[serde(alias = "mono_slope")]
    MonoSlope,
}

impl FrameType {
    /// All frame types
    pub const ALL: [FrameType; 4] = [
        FrameType::ClearSpan,
        FrameType::MultiSpan,
        FrameType::MultiGable,
        FrameType::MonoSlope,
    ];

    /// Canonical tag as written in config files and reports
    pub fn tag(&self) -> &'static str {
        match self {
            FrameType::ClearSpan => "ClearSpan",
            FrameType::MultiSpan => "MultiSpan",
            FrameType::MultiGable => "MultiGable",
            FrameType::MonoSlope => "MonoSlope",
        }
    }
}

impl FromStr for FrameType {
    type Err = String;

    /// Lenient parse: ignores case, spaces, hyphens and underscores
    /// ("Clear Span", "clear_span" and "CLEARSPAN" are all accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_tag(s);
        FrameType::ALL
            .into_iter()
            .find(|ft| normalize_tag(ft.tag()) == key)
            .ok_or_else(|| {
                format!(
                    "unknown frame type, expected one of {}",
                    FrameType::ALL.map(|ft| ft.tag()).join(", ")
                )
            })
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Design code governing the code-limit set applied to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DesignCode {
    #[serde(rename = "AISC")]
    Aisc,
    #[serde(rename = "IS800", alias = "IS 800")]
    Is800,
}

impl DesignCode {
    pub fn tag(&self) -> &'static str {
        match self {
            DesignCode::Aisc => "AISC",
            DesignCode::Is800 => "IS800",
        }
    }
}

impl FromStr for DesignCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "aisc" | "aisc360" => Ok(DesignCode::Aisc),
            "is800" => Ok(DesignCode::Is800),
            _ => Err("unknown design code, expected AISC or IS800".to_string()),
        }
    }
}

impl std::fmt::Display for DesignCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

fn normalize_tag(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// One member to size.
///
/// ## JSON Example
///
/// ```json
/// {
///   "member_id": "RF-1",
///   "length_m": 30.0,
///   "frame_type": "ClearSpan",
///   "design_code": "AISC",
///   "bay_spacing_m": 6.0,
///   "bay_pattern": null,
///   "quantity": 4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member mark (e.g., "M1", "RF-1")
    pub member_id: String,

    /// Total member length (m)
    pub length_m: f64,

    /// Frame type, selects the depth range
    pub frame_type: FrameType,

    /// Design code, selects the code-limit set
    #[serde(default)]
    pub design_code: Option<DesignCode>,

    /// Uniform bay spacing for this member (m), overrides the config value
    #[serde(default)]
    pub bay_spacing_m: Option<f64>,

    /// Explicit bay pattern, overrides any uniform bay spacing
    #[serde(default)]
    pub bay_pattern: Option<BayPattern>,

    /// Number of identical members
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl Member {
    /// Create a member with no bay data and quantity 1
    pub fn new(member_id: impl Into<String>, length_m: f64, frame_type: FrameType) -> Self {
        Member {
            member_id: member_id.into(),
            length_m,
            frame_type,
            design_code: None,
            bay_spacing_m: None,
            bay_pattern: None,
            quantity: 1,
        }
    }

    pub fn with_design_code(mut self, code: DesignCode) -> Self {
        self.design_code = Some(code);
        self
    }

    pub fn with_bay_spacing(mut self, bay_spacing_m: f64) -> Self {
        self.bay_spacing_m = Some(bay_spacing_m);
        self
    }

    pub fn with_bay_pattern(mut self, pattern: BayPattern) -> Self {
        self.bay_pattern = Some(pattern);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Validate input values.
    pub fn validate(&self) -> PlateResult<()> {
        if self.member_id.trim().is_empty() {
            return Err(PlateError::invalid_input(None, "member_id", "", "Member id must not be empty"));
        }
        if !self.length_m.is_finite() || self.length_m <= 0.0 {
            return Err(PlateError::invalid_input(
                None,
                "length_m",
                self.length_m.to_string(),
                format!("Member '{}' length must be positive", self.member_id),
            ));
        }
        if self.quantity == 0 {
            return Err(PlateError::invalid_input(
                None,
                "quantity",
                "0",
                format!("Member '{}' quantity must be at least 1", self.member_id),
            ));
        }
        Ok(())
    }
}
