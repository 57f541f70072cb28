use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Calibration – affine index/value → physical quantity mapping
// ---------------------------------------------------------------------------

/// Maps an array index (or a raw element value) to a physical quantity:
/// `calibrated = offset + scale * x`.
///
/// Immutable once built; transforms always produce fresh values. A zero scale
/// is accepted and simply makes the inverse conversion degenerate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    offset: f64,
    scale: f64,
    units: String,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            offset: 0.0,
            scale: 1.0,
            units: String::new(),
        }
    }
}

impl Calibration {
    pub fn new(offset: f64, scale: f64, units: impl Into<String>) -> Self {
        Calibration {
            offset,
            scale,
            units: units.into(),
        }
    }

    /// Identity calibration carrying only a unit label.
    pub fn with_units(units: impl Into<String>) -> Self {
        Calibration {
            units: units.into(),
            ..Default::default()
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// True when this is the identity mapping with no units.
    pub fn is_identity(&self) -> bool {
        self.offset == 0.0 && self.scale == 1.0 && self.units.is_empty()
    }

    pub fn convert_to_calibrated(&self, x: f64) -> f64 {
        self.offset + self.scale * x
    }

    /// Converts a width or delta; the offset does not apply.
    pub fn convert_to_calibrated_size(&self, dx: f64) -> f64 {
        self.scale * dx
    }

    pub fn convert_from_calibrated(&self, v: f64) -> f64 {
        (v - self.offset) / self.scale
    }

    pub fn convert_from_calibrated_size(&self, dv: f64) -> f64 {
        dv / self.scale
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x {:+} * {}", self.offset, self.scale)?;
        if !self.units.is_empty() {
            write!(f, " {}", self.units)?;
        }
        Ok(())
    }
}
