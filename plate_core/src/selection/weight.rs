//! Weight calculator.
//!
//! weight (kg) = (web unit weight + flange unit weight) x segment length,
//! with unit weights taken from [`Plate::unit_weight`] at 7850 kg/m³.
//! Pure function of (web, flange, length); no rounding happens here.

use crate::library::Plate;
use crate::units::{Kilograms, KgPerMeter, Meters};

/// Combined mass per meter of a (web, flange) pair
pub fn combined_unit_weight(web: &Plate, flange: &Plate) -> KgPerMeter {
    web.unit_weight() + flange.unit_weight()
}

/// Steel weight of a (web, flange) pair over `length`
pub fn weight(web: &Plate, flange: &Plate, length: Meters) -> Kilograms {
    combined_unit_weight(web, flange) * length
}

/// Steel weight in kg of a (web, flange) pair over `length_m` meters
pub fn weight_kg(web: &Plate, flange: &Plate, length_m: f64) -> f64 {
    weight(web, flange, Meters(length_m)).0
}
