//! # Code Limits
//!
//! Placeholder table of design-code coefficients, keyed by design code. Every
//! field is nullable: a limit that is null or absent makes its rule report
//! "Not evaluated" and pass, so the tool stays usable before real
//! coefficients are supplied.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "AISC":  { "flange_bt_max": null, "web_dt_max": null, "gamma_m0": null, "gamma_m1": null },
//!   "IS800": { "flange_bt_max": 10.0, "web_dt_max": null, "gamma_m0": 1.10, "gamma_m1": 1.25 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PlateError, PlateResult};
use crate::member::DesignCode;

/// Limits for one design code. `None` means unpopulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeLimitSet {
    /// Maximum flange width / thickness ratio
    pub flange_bt_max: Option<f64>,
    /// Maximum web depth / thickness ratio
    pub web_dt_max: Option<f64>,
    /// Partial safety factor for yielding
    pub gamma_m0: Option<f64>,
    /// Partial safety factor for buckling
    pub gamma_m1: Option<f64>,
}

impl CodeLimitSet {
    /// True when no limit is populated
    pub fn is_unpopulated(&self) -> bool {
        self.flange_bt_max.is_none() && self.web_dt_max.is_none() && self.gamma_m0.is_none() && self.gamma_m1.is_none()
    }

    fn fields(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("flange_bt_max", self.flange_bt_max),
            ("web_dt_max", self.web_dt_max),
            ("gamma_m0", self.gamma_m0),
            ("gamma_m1", self.gamma_m1),
        ]
    }
}

/// Code-limit sets by design code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeLimits {
    codes: BTreeMap<DesignCode, CodeLimitSet>,
}

impl CodeLimits {
    /// Empty table: every code rule reports "Not evaluated"
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON code-limits file
    pub fn load(path: &Path) -> PlateResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PlateError::file_error("read code limits", path.display().to_string(), e.to_string()))?;
        let limits = Self::from_json_str(&contents)?;
        tracing::debug!(path = %path.display(), codes = limits.codes.len(), "loaded code limits");
        Ok(limits)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(s: &str) -> PlateResult<Self> {
        let limits: CodeLimits =
            serde_json::from_str(s).map_err(|e| PlateError::config("code_limits", e.to_string()))?;
        limits.validate()?;
        Ok(limits)
    }

    /// Populated values must be positive and finite
    pub fn validate(&self) -> PlateResult<()> {
        for (code, set) in &self.codes {
            for (field, value) in set.fields() {
                if let Some(v) = value {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(PlateError::config(
                            format!("code_limits.{}.{}", code, field),
                            format!("must be positive when populated, got {}", v),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Limit set for a design code; unpopulated when the code or the member's
    /// design code is absent
    pub fn for_code(&self, code: Option<DesignCode>) -> CodeLimitSet {
        code.and_then(|c| self.codes.get(&c).copied()).unwrap_or_default()
    }

    pub fn with_set(mut self, code: DesignCode, set: CodeLimitSet) -> Self {
        self.codes.insert(code, set);
        self
    }

    /// True when no design code has any populated value
    pub fn is_unpopulated(&self) -> bool {
        self.codes.values().all(CodeLimitSet::is_unpopulated)
    }
}
