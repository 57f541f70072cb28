//! Transform library: pure functions from calibrated arrays to calibrated arrays.
//!
//! Every function pairs a numeric step (delegated to `ndarray` / `rustfft`)
//! with a rewrite of the calibrations and the descriptor:
//! ```text
//!   CalibratedArray(s) ──► validate shapes / axes ──► numeric kernel
//!                                                          │
//!   new CalibratedArray ◄── recalibrate + reclassify ◄─────┘
//! ```
//! Inputs are only ever borrowed; outputs are freshly allocated.

pub mod display;
pub mod fourier;
pub mod line_profile;
pub mod reduce;
pub mod structure;

pub use display::{display_data, display_data_with, display_rgba, display_rgba_image, display_rgba_with};
pub use fourier::{fft, fourier_mask, ifft};
pub use line_profile::line_profile;
pub use reduce::{slice_sum, sum, sum_region};
pub use structure::{concatenate, data_slice, hstack, index_axis, pick, vstack};

use crate::error::{Result, XDataError};

/// Rejects `axis` when it does not address an axis of an array of `rank`.
pub(crate) fn check_axis(operation: &'static str, axis: usize, rank: usize) -> Result<()> {
    if axis >= rank {
        return Err(XDataError::invalid_axis(
            operation,
            axis,
            format!("out of range for rank {rank}"),
        ));
    }
    Ok(())
}

/// Maps a normalized `[0, 1]` coordinate to an integer sample index,
/// flooring and clamping to `[0, extent)`.
pub(crate) fn normalized_to_index(position: f64, extent: usize) -> usize {
    let index = (position * extent as f64).floor();
    if index.is_nan() || index < 0.0 {
        0
    } else {
        (index as usize).min(extent.saturating_sub(1))
    }
}
