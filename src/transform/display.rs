use image::RgbaImage;
use ndarray::{ArrayD, Axis, IxDyn};

use crate::config::DisplaySettings;
use crate::data::calibration::Calibration;
use crate::data::descriptor::DataDescriptor;
use crate::data::element::{ArrayData, Rgba};
use crate::data::model::CalibratedArray;
use crate::error::{Result, XDataError};

use super::reduce::slice_sum;
use super::structure::index_axis;

// ---------------------------------------------------------------------------
// Reduction to at most two displayable axes
// ---------------------------------------------------------------------------

fn clamp_index(index: usize, extent: usize) -> usize {
    index.min(extent.saturating_sub(1))
}

/// Index every axis in `axes` (ascending) at the matching entry of `indices`,
/// removing them from the back so positions stay valid.
fn index_axes(src: CalibratedArray, axes: &[usize], indices: &[usize]) -> Result<CalibratedArray> {
    let mut work = src;
    for (k, &axis) in axes.iter().enumerate().rev() {
        let extent = work.data_shape()[axis];
        let index = clamp_index(indices.get(k).copied().unwrap_or(0), extent);
        work = index_axis(&work, axis, index)?;
    }
    Ok(work)
}

fn reduce_for_display(src: &CalibratedArray, settings: &DisplaySettings) -> Result<CalibratedArray> {
    let mut work = src.clone();
    if work.is_sequence() {
        let index = clamp_index(settings.sequence_index, work.data_shape()[0]);
        work = index_axis(&work, 0, index)?;
    }

    let d = work.data_descriptor();
    let collection: Vec<usize> = d.collection_dimension_indices().collect();
    work = match (d.collection_dimension_count, d.datum_dimension_count) {
        // Collection of spectra: navigate extra axes, then slice the signal.
        (c, 1) if c >= 2 => {
            let navigated = index_axes(work, &collection[..c - 2], &settings.collection_index)?;
            let extent = navigated.data_shape()[navigated.ndim() - 1];
            let center = settings.slice_center.unwrap_or(extent / 2);
            slice_sum(&navigated, center, settings.slice_width)?
        }
        // Collection of images: show the image at the navigation position.
        (c, 2) if c >= 1 => index_axes(work, &collection, &settings.collection_index)?,
        _ => work,
    };

    while work.ndim() > 2 {
        work = index_axis(&work, 0, 0)?;
    }
    Ok(work)
}

fn display_descriptor(rank: usize) -> DataDescriptor {
    DataDescriptor::new(false, 0, rank.min(2))
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Scalar (or RGBA) projection of `src` with at most two axes, using default
/// [`DisplaySettings`]. The result never shares storage with `src`.
pub fn display_data(src: &CalibratedArray) -> Result<CalibratedArray> {
    display_data_with(src, &DisplaySettings::default())
}

/// Like [`display_data`] with explicit settings.
///
/// Sequences show `sequence_index`; collections of images show the image at
/// `collection_index`; collections of spectra show a slice sum of the signal
/// axis. Complex values are converted with `complex_display`.
pub fn display_data_with(src: &CalibratedArray, settings: &DisplaySettings) -> Result<CalibratedArray> {
    let reduced = reduce_for_display(src, settings)?;
    let data = match reduced.data() {
        ArrayData::Complex(values) => ArrayData::real(values.mapv(|z| settings.complex_display.apply(z))),
        other => other.clone(),
    };
    let rank = data.ndim();
    log::debug!("display_data: {:?} -> {:?}", src.data_shape(), data.shape());
    CalibratedArray::derived(
        &reduced,
        data,
        reduced.intensity_calibration().clone(),
        reduced.dimensional_calibrations().to_vec(),
        display_descriptor(rank),
    )
}

/// 2-D RGBA projection of `src` using default [`DisplaySettings`].
pub fn display_rgba(src: &CalibratedArray) -> Result<CalibratedArray> {
    display_rgba_with(src, &DisplaySettings::default())
}

/// Like [`display_rgba`] with explicit settings.
///
/// Scalar data is mapped through `color_map` between `display_limits`
/// (the finite data range when unset). 1-D results become a `1 × n` strip.
pub fn display_rgba_with(src: &CalibratedArray, settings: &DisplaySettings) -> Result<CalibratedArray> {
    let display = display_data_with(src, settings)?;
    let pixels = match display.data() {
        ArrayData::Rgba(values) => values.clone(),
        other => colorize(&other.real_part(), settings),
    };

    let (pixels, dimensional_calibrations) = match pixels.ndim() {
        0 => (
            pixels.into_shape_with_order(IxDyn(&[1, 1])).map_err(|_| {
                XDataError::shape_mismatch("display_rgba", &[1, 1], &display.data_shape())
            })?,
            vec![Calibration::default(); 2],
        ),
        1 => {
            let mut calibrations = vec![Calibration::default()];
            calibrations.extend_from_slice(display.dimensional_calibrations());
            (pixels.insert_axis(Axis(0)), calibrations)
        }
        _ => (pixels, display.dimensional_calibrations().to_vec()),
    };

    CalibratedArray::derived(
        &display,
        ArrayData::rgba(pixels),
        Calibration::default(),
        dimensional_calibrations,
        display_descriptor(2),
    )
}

/// Render `src` into an `image` buffer via [`display_rgba_with`].
pub fn display_rgba_image(src: &CalibratedArray, settings: &DisplaySettings) -> Result<RgbaImage> {
    let display = display_rgba_with(src, settings)?;
    let shape = display.data_shape();
    let pixels = display
        .data()
        .as_rgba()
        .ok_or_else(|| XDataError::shape_mismatch("display_rgba_image", &shape, &shape))?;
    let (width, height) = image_dimensions(&shape)?;
    let raw: Vec<u8> = pixels.iter().flat_map(|p| p.to_array()).collect();
    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| XDataError::shape_mismatch("display_rgba_image", &shape, &[pixels.len()]))
}

/// `(width, height)` of a `[rows, cols]` display shape; extents past `u32::MAX` are rejected.
fn image_dimensions(shape: &[usize]) -> Result<(u32, u32)> {
    let too_large = || {
        let limit = u32::MAX as usize;
        XDataError::shape_mismatch("display_rgba_image", &[shape[0].min(limit), shape[1].min(limit)], shape)
    };
    let width = u32::try_from(shape[1]).map_err(|_| too_large())?;
    let height = u32::try_from(shape[0]).map_err(|_| too_large())?;
    Ok((width, height))
}

fn finite_range(values: &ArrayD<f64>) -> (f64, f64) {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<(f64, f64)>, &v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 0.0))
}

fn colorize(values: &ArrayD<f64>, settings: &DisplaySettings) -> ArrayD<Rgba> {
    let (low, high) = settings.display_limits.unwrap_or_else(|| finite_range(values));
    let span = high - low;
    let table = settings.color_map.lookup_table();
    let last = table.len() - 1;
    values.mapv(|v| {
        let fraction = if span > 0.0 { (v - low) / span } else { 0.0 };
        if fraction.is_nan() {
            return Rgba::TRANSPARENT;
        }
        table[(fraction.clamp(0.0, 1.0) * last as f64).round() as usize]
    })
}
