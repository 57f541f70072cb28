use std::ops::Range;

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};

use crate::data::calibration::Calibration;
use crate::data::descriptor::DataDescriptor;
use crate::data::element::{map_elements, ArrayData, ScalarKind};
use crate::data::model::CalibratedArray;
use crate::error::{Result, XDataError};

use super::{check_axis, normalized_to_index};

// ---------------------------------------------------------------------------
// Indexing and slicing
// ---------------------------------------------------------------------------

/// Remove `axis` by taking the single sample at `index`. The axis loses its
/// calibration and its role in the descriptor.
pub fn index_axis(src: &CalibratedArray, axis: usize, index: usize) -> Result<CalibratedArray> {
    check_axis("index_axis", axis, src.ndim())?;
    let extent = src.data_shape()[axis];
    if index >= extent {
        return Err(XDataError::invalid_axis(
            "index_axis",
            axis,
            format!("index {index} out of range for length {extent}"),
        ));
    }
    let data = map_elements!(src.data(), |values| values.index_axis(Axis(axis), index).to_owned());
    let mut dimensional_calibrations = src.dimensional_calibrations().to_vec();
    dimensional_calibrations.remove(axis);
    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        src.data_descriptor().without_axes(&[axis]),
    )
}

/// Take a contiguous sub-range along the leading `ranges.len()` axes; any
/// remaining axes are kept whole. Each sliced axis is re-based so its
/// calibrated coordinates are unchanged.
pub fn data_slice(src: &CalibratedArray, ranges: &[Range<usize>]) -> Result<CalibratedArray> {
    let shape = src.data_shape();
    if ranges.len() > shape.len() {
        return Err(XDataError::invalid_axis(
            "data_slice",
            ranges.len() - 1,
            format!("{} ranges for rank {}", ranges.len(), shape.len()),
        ));
    }
    for (axis, range) in ranges.iter().enumerate() {
        if range.start > range.end || range.end > shape[axis] {
            return Err(XDataError::invalid_axis(
                "data_slice",
                axis,
                format!("range {range:?} outside length {}", shape[axis]),
            ));
        }
    }

    let data = map_elements!(src.data(), |values| {
        let mut view = values.view();
        for (axis, range) in ranges.iter().enumerate() {
            view.slice_axis_inplace(Axis(axis), Slice::from(range.clone()));
        }
        view.to_owned()
    });
    let dimensional_calibrations = src
        .dimensional_calibrations()
        .iter()
        .enumerate()
        .map(|(axis, c)| match ranges.get(axis) {
            Some(range) => Calibration::new(c.convert_to_calibrated(range.start as f64), c.scale(), c.units()),
            None => c.clone(),
        })
        .collect();

    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        src.data_descriptor(),
    )
}

/// Select one navigation point: index every collection axis at the given
/// normalized position (floored to a sample).
///
/// The output keeps only the datum axes, plus the sequence axis when there
/// is one, with their calibrations in their original order.
pub fn pick(src: &CalibratedArray, position: &[f64]) -> Result<CalibratedArray> {
    let descriptor = src.data_descriptor();
    let collection_axes = descriptor.collection_dimension_indices();
    if collection_axes.is_empty() {
        return Err(XDataError::invalid_axis("pick", 0, "array has no collection axes"));
    }
    if position.len() != collection_axes.len() {
        return Err(XDataError::invalid_axis(
            "pick",
            collection_axes.start,
            format!(
                "position has {} coordinates for {} collection axes",
                position.len(),
                collection_axes.len()
            ),
        ));
    }
    let shape = src.data_shape();
    if let Some(axis) = collection_axes.clone().find(|&axis| shape[axis] == 0) {
        return Err(XDataError::invalid_axis("pick", axis, "empty collection axis"));
    }
    let indices: Vec<usize> = collection_axes
        .clone()
        .zip(position)
        .map(|(axis, &p)| normalized_to_index(p, shape[axis]))
        .collect();

    let data = map_elements!(src.data(), |values| {
        let mut picked = values.view();
        for (axis, &index) in collection_axes.clone().zip(&indices).rev() {
            picked = picked.index_axis_move(Axis(axis), index);
        }
        picked.to_owned()
    });
    let dimensional_calibrations = src
        .dimensional_calibrations()
        .iter()
        .enumerate()
        .filter(|(axis, _)| !collection_axes.contains(axis))
        .map(|(_, c)| c.clone())
        .collect();

    log::debug!("pick: {position:?} -> collection index {indices:?}");
    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        descriptor.with_counts(descriptor.is_sequence, 0, descriptor.datum_dimension_count),
    )
}

// ---------------------------------------------------------------------------
// Joining
// ---------------------------------------------------------------------------

fn join<A: Clone>(views: &[ArrayViewD<'_, A>], axis: usize) -> Result<ArrayD<A>> {
    ndarray::concatenate(Axis(axis), views).map_err(|_| {
        let expected = views.first().map(|v| v.shape().to_vec()).unwrap_or_default();
        let got = views.last().map(|v| v.shape().to_vec()).unwrap_or_default();
        XDataError::shape_mismatch("concatenate", &expected, &got)
    })
}

/// Joins the raw arrays in a common element kind: RGBA only when every
/// input is RGBA, complex when any input is complex, real otherwise.
fn join_data(arrays: &[CalibratedArray], axis: usize) -> Result<ArrayData> {
    let all_rgba: Option<Vec<_>> = arrays.iter().map(|a| a.data().as_rgba()).collect();
    if let Some(rgba) = all_rgba {
        let views: Vec<_> = rgba.iter().map(|v| v.view()).collect();
        return Ok(ArrayData::rgba(join(&views, axis)?));
    }
    if arrays.iter().any(|a| a.data().as_complex().is_some()) {
        let owned: Vec<_> = arrays.iter().map(|a| a.data().to_complex()).collect();
        let views: Vec<_> = owned.iter().map(|v| v.view()).collect();
        return Ok(ArrayData::complex(join(&views, axis)?));
    }
    let kind = arrays
        .iter()
        .map(|a| match a.data() {
            ArrayData::Real { kind, .. } => *kind,
            _ => ScalarKind::Float64,
        })
        .reduce(ScalarKind::promote)
        .unwrap_or(ScalarKind::Float64);
    let owned: Vec<_> = arrays.iter().map(|a| a.data().real_part()).collect();
    let views: Vec<_> = owned.iter().map(|v| v.view()).collect();
    Ok(ArrayData::scalar(kind, join(&views, axis)?))
}

/// Concatenate along `axis`.
///
/// All inputs must share rank and every extent except `axis`. Calibrations,
/// intensity calibration and descriptor all come from the first input; the
/// other inputs' calibrations on the join axis are not reconciled.
pub fn concatenate(arrays: &[CalibratedArray], axis: usize) -> Result<CalibratedArray> {
    let first = arrays.first().ok_or(XDataError::EmptyInput { operation: "concatenate" })?;
    let rank = first.ndim();
    check_axis("concatenate", axis, rank)?;
    let first_shape = first.data_shape();
    for other in &arrays[1..] {
        let shape = other.data_shape();
        let compatible = shape.len() == rank
            && shape
                .iter()
                .zip(&first_shape)
                .enumerate()
                .all(|(i, (a, b))| i == axis || a == b);
        if !compatible {
            return Err(XDataError::shape_mismatch("concatenate", &first_shape, &shape));
        }
        if other.dimensional_calibrations()[axis] != first.dimensional_calibrations()[axis] {
            log::debug!("concatenate: axis {axis} calibrations differ, keeping the first");
        }
    }

    let data = join_data(arrays, axis)?;
    CalibratedArray::derived(
        first,
        data,
        first.intensity_calibration().clone(),
        first.dimensional_calibrations().to_vec(),
        first.data_descriptor(),
    )
}

/// Lift a 1-D array to a single row with a new, uncalibrated leading collection axis.
fn as_row(src: &CalibratedArray) -> Result<CalibratedArray> {
    let data = map_elements!(src.data(), |values| values.view().insert_axis(Axis(0)).to_owned());
    let mut dimensional_calibrations = vec![Calibration::default()];
    dimensional_calibrations.extend_from_slice(src.dimensional_calibrations());
    let d = src.data_descriptor();
    CalibratedArray::derived(
        src,
        data,
        src.intensity_calibration().clone(),
        dimensional_calibrations,
        DataDescriptor::new(d.is_sequence, d.collection_dimension_count + 1, d.datum_dimension_count),
    )
}

/// Stack vertically: 1-D inputs become the rows of a 2-D array, higher
/// ranks join along axis 0.
pub fn vstack(arrays: &[CalibratedArray]) -> Result<CalibratedArray> {
    let first = arrays.first().ok_or(XDataError::EmptyInput { operation: "vstack" })?;
    if first.ndim() == 1 {
        let rows = arrays.iter().map(as_row).collect::<Result<Vec<_>>>()?;
        concatenate(&rows, 0)
    } else {
        concatenate(arrays, 0)
    }
}

/// Stack horizontally: 1-D inputs join end to end, higher ranks join along axis 1.
pub fn hstack(arrays: &[CalibratedArray]) -> Result<CalibratedArray> {
    let first = arrays.first().ok_or(XDataError::EmptyInput { operation: "hstack" })?;
    let axis = if first.ndim() == 1 { 0 } else { 1 };
    concatenate(arrays, axis)
}
