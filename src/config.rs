use std::path::Path;

use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// ComplexDisplay – how complex values become displayable scalars
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexDisplay {
    Real,
    Imaginary,
    Absolute,
    Phase,
    #[default]
    LogAbsolute,
}

impl ComplexDisplay {
    pub fn apply(self, z: Complex64) -> f64 {
        match self {
            ComplexDisplay::Real => z.re,
            ComplexDisplay::Imaginary => z.im,
            ComplexDisplay::Absolute => z.norm(),
            ComplexDisplay::Phase => z.arg(),
            ComplexDisplay::LogAbsolute => (z.norm() + f64::MIN_POSITIVE).ln(),
        }
    }
}

// ---------------------------------------------------------------------------
// DisplaySettings – parameters of the display projections
// ---------------------------------------------------------------------------

/// Controls how an arbitrary-rank array is reduced to a 2-D preview.
///
/// JSON layout (every key optional):
///
/// ```json
/// {
///   "sequence_index": 0,
///   "collection_index": [4, 7],
///   "slice_center": 120,
///   "slice_width": 5,
///   "complex_display": "log-absolute",
///   "display_limits": [0.0, 1000.0],
///   "color_map": "rainbow"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Frame shown from a sequence.
    pub sequence_index: usize,
    /// Navigation position for collections of images; missing entries are 0.
    pub collection_index: Vec<usize>,
    /// Signal channel summed for collections of spectra; defaults to the middle.
    pub slice_center: Option<usize>,
    pub slice_width: usize,
    pub complex_display: ComplexDisplay,
    /// Values mapped to the ends of the colour map; defaults to the data range.
    pub display_limits: Option<(f64, f64)>,
    pub color_map: ColorMap,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            sequence_index: 0,
            collection_index: Vec::new(),
            slice_center: None,
            slice_width: 1,
            complex_display: ComplexDisplay::default(),
            display_limits: None,
            color_map: ColorMap::default(),
        }
    }
}

impl DisplaySettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "json" {
            bail!("Unsupported settings file extension: .{ext}");
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: DisplaySettings = serde_json::from_str(text).context("parsing display settings")?;
        if settings.slice_width == 0 {
            bail!("slice_width must be at least 1");
        }
        if let Some((low, high)) = settings.display_limits {
            if !(low < high) {
                bail!("display_limits must be increasing, got [{low}, {high}]");
            }
        }
        Ok(settings)
    }
}
