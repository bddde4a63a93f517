//! # Plate Library
//!
//! The fabricator's plate size library: an ordered list of web plates and an
//! ordered list of flange plates. Row order is significant. Each plate keeps
//! its position in its table as `source_index`, which is the tie-breaker when
//! two combinations weigh the same.
//!
//! Plates are immutable once loaded. Candidates borrow them for the duration
//! of a run.
//!
//! ## Example
//!
//! ```rust
//! use plate_core::library::{PlateKind, PlateLibrary};
//!
//! let mut library = PlateLibrary::new();
//! library.push(PlateKind::Web, 8.0, 200.0).unwrap();
//! library.push(PlateKind::Flange, 10.0, 150.0).unwrap();
//! library.push(PlateKind::Flange, 12.0, 150.0).unwrap();
//!
//! assert_eq!(library.webs().len(), 1);
//! assert_eq!(library.flanges()[1].source_index, 1);
//! assert!((library.webs()[0].unit_weight_kg_per_m() - 12.56).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PlateError, PlateResult};
use crate::units::{KgPerCubicMeter, KgPerMeter, Millimeters};

/// Density of structural steel (kg/m³)
pub const STEEL_DENSITY: KgPerCubicMeter = KgPerCubicMeter(7850.0);

/// Which part of the built-up section a plate is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateKind {
    Web,
    Flange,
}

impl PlateKind {
    /// Table name used in library files
    pub fn table_name(&self) -> &'static str {
        match self {
            PlateKind::Web => "web",
            PlateKind::Flange => "flange",
        }
    }

    /// Parse a table/kind name, case-insensitive
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "web" | "webs" => Some(PlateKind::Web),
            "flange" | "flanges" => Some(PlateKind::Flange),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A single plate size from the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    /// Web or flange
    pub kind: PlateKind,

    /// Plate thickness (mm)
    pub thickness_mm: f64,

    /// Plate width (mm). For a web plate this is the web depth.
    pub width_mm: f64,

    /// Zero-based position in its library table
    pub source_index: usize,
}

impl Plate {
    /// Create a plate, validating that both dimensions are positive and finite
    pub fn new(kind: PlateKind, thickness_mm: f64, width_mm: f64, source_index: usize) -> PlateResult<Self> {
        for (field, value) in [("thickness_mm", thickness_mm), ("width_mm", width_mm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlateError::library(
                    kind.table_name(),
                    Some(source_index + 1),
                    format!("{} must be a positive number, got {}", field, value),
                ));
            }
        }
        Ok(Plate {
            kind,
            thickness_mm,
            width_mm,
            source_index,
        })
    }

    /// Mass per meter of plate length at [`STEEL_DENSITY`]
    pub fn unit_weight(&self) -> KgPerMeter {
        STEEL_DENSITY.linear_mass(Millimeters(self.thickness_mm), Millimeters(self.width_mm))
    }

    /// Mass per meter of plate length, as a bare number (kg/m)
    pub fn unit_weight_kg_per_m(&self) -> f64 {
        self.unit_weight().0
    }

    /// Width-to-thickness ratio
    pub fn slenderness(&self) -> f64 {
        self.width_mm / self.thickness_mm
    }

    /// Fabrication designation, thickness x width (e.g. "8 x 200")
    pub fn designation(&self) -> String {
        format!("{} x {}", fmt_dim(self.thickness_mm), fmt_dim(self.width_mm))
    }
}

impl std::fmt::Display for Plate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} mm (#{})", self.kind, self.designation(), self.source_index)
    }
}

fn fmt_dim(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Ordered web and flange plate tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateLibrary {
    webs: Vec<Plate>,
    flanges: Vec<Plate>,
}

impl PlateLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from (thickness_mm, width_mm) pairs, in order
    pub fn from_dimensions(webs: &[(f64, f64)], flanges: &[(f64, f64)]) -> PlateResult<Self> {
        let mut library = PlateLibrary::new();
        for &(t, w) in webs {
            library.push(PlateKind::Web, t, w)?;
        }
        for &(t, w) in flanges {
            library.push(PlateKind::Flange, t, w)?;
        }
        Ok(library)
    }

    /// Append a plate to the end of its table, assigning the next source index
    pub fn push(&mut self, kind: PlateKind, thickness_mm: f64, width_mm: f64) -> PlateResult<&Plate> {
        let table = match kind {
            PlateKind::Web => &mut self.webs,
            PlateKind::Flange => &mut self.flanges,
        };
        let plate = Plate::new(kind, thickness_mm, width_mm, table.len())?;
        table.push(plate);
        Ok(&table[table.len() - 1])
    }

    /// Web plates in library order
    pub fn webs(&self) -> &[Plate] {
        &self.webs
    }

    /// Flange plates in library order
    pub fn flanges(&self) -> &[Plate] {
        &self.flanges
    }

    /// Plates of one kind in library order
    pub fn plates(&self, kind: PlateKind) -> &[Plate] {
        match kind {
            PlateKind::Web => &self.webs,
            PlateKind::Flange => &self.flanges,
        }
    }

    /// Total number of plates across both tables
    pub fn len(&self) -> usize {
        self.webs.len() + self.flanges.len()
    }

    /// True when neither table has any plate
    pub fn is_empty(&self) -> bool {
        self.webs.is_empty() && self.flanges.is_empty()
    }

    /// Number of (web, flange) pairs in the search space
    pub fn combination_count(&self) -> usize {
        self.webs.len() * self.flanges.len()
    }
}
