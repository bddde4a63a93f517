//! # Unit Types
//!
//! Type-safe wrappers for the metric units used by plate selection. Plate
//! dimensions arrive in millimeters, member and segment lengths in meters,
//! and weights are reported in kilograms.
//!
//! The wrappers are plain `f64` newtypes that serialize as bare numbers.
//!
//! ## Example
//!
//! ```rust
//! use plate_core::units::{Meters, Millimeters, KgPerMeter};
//!
//! let thickness: Meters = Millimeters(8.0).into();
//! assert!((thickness.0 - 0.008).abs() < 1e-12);
//!
//! let weight = KgPerMeter(12.56) * Meters(6.0);
//! assert!((weight.0 - 75.36).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Linear mass in kilograms per meter of length
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgPerMeter(pub f64);

impl Add for KgPerMeter {
    type Output = KgPerMeter;
    fn add(self, rhs: KgPerMeter) -> KgPerMeter {
        KgPerMeter(self.0 + rhs.0)
    }
}

impl Mul<Meters> for KgPerMeter {
    type Output = Kilograms;
    fn mul(self, length: Meters) -> Kilograms {
        Kilograms(self.0 * length.0)
    }
}

// ============================================================================
// Density
// ============================================================================

/// Density in kilograms per cubic meter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgPerCubicMeter(pub f64);

impl KgPerCubicMeter {
    /// Linear mass of a rectangular cross-section given in millimeters
    pub fn linear_mass(self, thickness: Millimeters, width: Millimeters) -> KgPerMeter {
        let t: Meters = thickness.into();
        let w: Meters = width.into();
        KgPerMeter(t.0 * w.0 * self.0)
    }
}
