use std::collections::BTreeSet;

use ndarray::{ArrayD, ArrayView2, Axis, LinalgScalar, Slice};

use crate::data::element::{ArrayData, NumericArray};
use crate::data::model::CalibratedArray;
use crate::error::{Result, XDataError};

use super::check_axis;

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// Sums over `axes`, which must be sorted in descending order so earlier
/// removals do not shift later indices.
fn sum_axes<A: LinalgScalar>(values: &ArrayD<A>, descending_axes: &[usize]) -> ArrayD<A> {
    let mut out = values.to_owned();
    for &axis in descending_axes {
        out = out.sum_axis(Axis(axis));
    }
    out
}

fn sum_window<A: LinalgScalar>(values: &ArrayD<A>, start: usize, stop: usize) -> ArrayD<A> {
    let last = Axis(values.ndim() - 1);
    values.slice_axis(last, Slice::from(start..stop)).sum_axis(last)
}

/// Accumulates the sub-arrays at every non-zero mask position. The two
/// collection axes sit at `first` and `first + 1`.
fn masked_sum<A: LinalgScalar>(values: &ArrayD<A>, first: usize, mask: &ArrayView2<'_, f64>) -> ArrayD<A> {
    let mut shape = values.shape().to_vec();
    shape.drain(first..first + 2);
    let mut total = ArrayD::<A>::zeros(shape);
    for ((row, col), &weight) in mask.indexed_iter() {
        if weight != 0.0 {
            let sub = values.index_axis(Axis(first + 1), col);
            total = total + &sub.index_axis(Axis(first), row);
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Sum over `axes`.
///
/// The summed axes lose their calibrations and are removed from whichever
/// role they held; intensity calibration is unchanged. Integer data is
/// summed into `Int64`, float data into `Float64`, RGBA as luminance.
pub fn sum(src: &CalibratedArray, axes: &[usize]) -> Result<CalibratedArray> {
    let rank = src.ndim();
    let mut unique = BTreeSet::new();
    for &axis in axes {
        check_axis("sum", axis, rank)?;
        if !unique.insert(axis) {
            return Err(XDataError::invalid_axis("sum", axis, "axis listed more than once"));
        }
    }
    let descending: Vec<usize> = unique.iter().rev().copied().collect();

    let data = match src.data().to_numeric() {
        NumericArray::Real(kind, values) => ArrayData::scalar(kind.accumulator(), sum_axes(&values, &descending)),
        NumericArray::Complex(values) => ArrayData::complex(sum_axes(&values, &descending)),
    };
    let dimensional_calibrations = src
        .dimensional_calibrations()
        .iter()
        .enumerate()
        .filter(|(i, _)| !unique.contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    let descriptor = src.data_descriptor().without_axes(axes);

    log::debug!("sum over {axes:?}: {:?} -> {:?}", src.data_shape(), data.shape());
    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        descriptor,
    )
}

/// Sum `width` samples of the last datum axis, starting at
/// `center - width / 2` and clamped to the axis bounds.
///
/// The signal axis is removed. Former collection axes become datum axes, so
/// a slice through a spectrum image is an image.
pub fn slice_sum(src: &CalibratedArray, center: usize, width: usize) -> Result<CalibratedArray> {
    let descriptor = src.data_descriptor();
    if descriptor.datum_dimension_count == 0 {
        return Err(XDataError::invalid_axis(
            "slice_sum",
            src.ndim(),
            "array has no datum axis to slice",
        ));
    }
    let rank = src.ndim();
    let extent = src.data_shape()[rank - 1];
    let start = center.saturating_sub(width / 2).min(extent);
    let stop = (center.saturating_sub(width / 2) + width).min(extent);
    if stop - start < width {
        log::warn!("slice_sum: window [{start}, {stop}) clamped to axis of length {extent}");
    }

    let data = match src.data().to_numeric() {
        NumericArray::Real(kind, values) => ArrayData::scalar(kind.accumulator(), sum_window(&values, start, stop)),
        NumericArray::Complex(values) => ArrayData::complex(sum_window(&values, start, stop)),
    };

    let dimensional_calibrations = src.dimensional_calibrations()[..rank - 1].to_vec();
    let reduced = descriptor.without_axes(&[rank - 1]);
    let descriptor = if reduced.datum_dimension_count == 0 {
        reduced.with_counts(reduced.is_sequence, 0, reduced.collection_dimension_count)
    } else {
        reduced
    };

    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        descriptor,
    )
}

/// Sum the datum sub-arrays at every position where the 2-D `mask` is
/// non-zero. The mask must match the two collection axes of `src`.
///
/// The sequence axis, if any, is kept; the output holds the datum axes with
/// their calibrations.
pub fn sum_region(src: &CalibratedArray, mask: &CalibratedArray) -> Result<CalibratedArray> {
    let descriptor = src.data_descriptor();
    if descriptor.collection_dimension_count != 2 {
        return Err(XDataError::invalid_axis(
            "sum_region",
            descriptor.collection_dimension_indices().start,
            format!(
                "needs exactly two collection axes, found {}",
                descriptor.collection_dimension_count
            ),
        ));
    }
    let collection_shape = src.collection_dimension_shape();
    if mask.data_shape() != collection_shape {
        return Err(XDataError::shape_mismatch("sum_region", &collection_shape, &mask.data_shape()));
    }
    let weights = mask.data().to_scalar();
    let weights = weights
        .view()
        .into_dimensionality::<ndarray::Ix2>()
        .map_err(|_| XDataError::shape_mismatch("sum_region", &collection_shape, &mask.data_shape()))?;

    let first = descriptor.collection_dimension_indices().start;
    let data = match src.data().to_numeric() {
        NumericArray::Real(kind, values) => ArrayData::scalar(kind.accumulator(), masked_sum(&values, first, &weights)),
        NumericArray::Complex(values) => ArrayData::complex(masked_sum(&values, first, &weights)),
    };
    let dimensional_calibrations = src
        .dimensional_calibrations()
        .iter()
        .enumerate()
        .filter(|(i, _)| !descriptor.collection_dimension_indices().contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    let output_descriptor = descriptor.with_counts(descriptor.is_sequence, 0, descriptor.datum_dimension_count);

    log::debug!(
        "sum_region: {} positions selected",
        weights.iter().filter(|w| **w != 0.0).count()
    );
    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        output_descriptor,
    )
}
