use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::data::element::Rgba;

const TABLE_SIZE: usize = 256;

// ---------------------------------------------------------------------------
// ColorMap – scalar intensity → display colour
// ---------------------------------------------------------------------------

/// Colour map applied when projecting scalar data to RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMap {
    #[default]
    Grayscale,
    /// Hue sweep from violet (low) to red (high).
    Rainbow,
}

impl ColorMap {
    /// Precomputed 256-entry lookup table, low to high.
    pub fn lookup_table(self) -> Vec<Rgba> {
        (0..TABLE_SIZE)
            .map(|i| self.color_at(i as f32 / (TABLE_SIZE - 1) as f32))
            .collect()
    }

    /// Colour for a fraction in `[0, 1]`; values outside are clamped.
    pub fn color_at(self, fraction: f32) -> Rgba {
        let t = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let rgb: Srgb = match self {
            ColorMap::Grayscale => Srgb::new(t, t, t),
            ColorMap::Rainbow => Hsl::new(270.0 * (1.0 - t), 0.85, 0.5).into_color(),
        };
        Rgba::opaque(to_byte(rgb.red), to_byte(rgb.green), to_byte(rgb.blue))
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
