use ndarray::{Array2, ArrayD, IxDyn, LinalgScalar};

use crate::data::calibration::Calibration;
use crate::data::element::{ArrayData, NumericArray};
use crate::data::model::CalibratedArray;
use crate::error::{Result, XDataError};

/// Start and end of a line segment in normalized `(y, x)` coordinates.
pub type LineVector = ((f64, f64), (f64, f64));

// ---------------------------------------------------------------------------
// Sampling geometry
// ---------------------------------------------------------------------------

/// Pixel-space description of a profile: integer start, unit step along the
/// line, unit normal and the perpendicular offsets that are summed.
#[derive(Debug, Clone)]
struct ProfileGeometry {
    start: (f64, f64),
    step: (f64, f64),
    normal: (f64, f64),
    length: usize,
    offsets: Vec<f64>,
}

impl ProfileGeometry {
    fn new(vector: LineVector, height: usize, width: usize, line_width: f64) -> Self {
        let ((y0, x0), (y1, x1)) = vector;
        let (h, w) = (height as f64, width as f64);
        // Endpoints snap to whole samples so sub-pixel jitter gives identical profiles.
        let start = ((y0 * h).floor(), (x0 * w).floor());
        let end = ((y1 * h).floor(), (x1 * w).floor());
        let (dy, dx) = (end.0 - start.0, end.1 - start.1);
        let distance = dy.hypot(dx);
        let length = distance.round() as usize;
        let (step, normal) = if distance > 0.0 {
            let step = (dy / distance, dx / distance);
            (step, (-step.1, step.0))
        } else {
            ((0.0, 0.0), (0.0, 0.0))
        };
        let rows = line_width.round().max(1.0) as usize;
        let center = (rows - 1) as f64 / 2.0;
        let offsets = (0..rows).map(|k| k as f64 - center).collect();
        ProfileGeometry {
            start,
            step,
            normal,
            length,
            offsets,
        }
    }

    /// Sums the perpendicular samples at position `i` along the line.
    /// Samples falling outside the image contribute nothing.
    fn sample<A: LinalgScalar>(&self, image: &ndarray::ArrayView2<'_, A>, i: usize) -> A {
        let (height, width) = image.dim();
        let mut total = A::zero();
        for &offset in &self.offsets {
            let y = (self.start.0 + i as f64 * self.step.0 + offset * self.normal.0).round();
            let x = (self.start.1 + i as f64 * self.step.1 + offset * self.normal.1).round();
            if y < 0.0 || x < 0.0 || y >= height as f64 || x >= width as f64 {
                continue;
            }
            total = total + image[[y as usize, x as usize]];
        }
        total
    }
}

fn sample_profiles<A: LinalgScalar>(
    values: &ArrayD<A>,
    geometry: &ProfileGeometry,
) -> Result<ArrayD<A>> {
    let shape = values.shape();
    let rank = shape.len();
    let (height, width) = (shape[rank - 2], shape[rank - 1]);
    let leading: usize = shape[..rank - 2].iter().product();
    let stacked = values
        .to_shape((leading, height, width))
        .map_err(|_| XDataError::shape_mismatch("line_profile", &[leading, height, width], shape))?;

    let profiles = Array2::from_shape_fn((leading, geometry.length), |(frame, i)| {
        geometry.sample(&stacked.index_axis(ndarray::Axis(0), frame), i)
    });

    let mut out_shape = shape[..rank - 2].to_vec();
    out_shape.push(geometry.length);
    profiles
        .into_shape_with_order(IxDyn(&out_shape))
        .map_err(|_| XDataError::shape_mismatch("line_profile", &out_shape, &[leading, geometry.length]))
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Sample a line profile across the last two axes of `src`.
///
/// `vector` holds the start and end points in normalized `(y, x)`
/// coordinates. Both endpoints are floored to whole samples. `width`
/// perpendicular rows are summed at each position, and the output intensity
/// scale is divided by `width` to compensate. Leading axes are kept, so a
/// sequence of images yields a sequence of profiles.
///
/// The output axis is calibrated as distance from the start point when both
/// sampled axes share scale and units; otherwise it is left uncalibrated.
pub fn line_profile(src: &CalibratedArray, vector: LineVector, width: f64) -> Result<CalibratedArray> {
    let rank = src.ndim();
    if rank < 2 {
        return Err(XDataError::invalid_axis(
            "line_profile",
            rank.saturating_sub(1),
            "line profiles need at least two axes",
        ));
    }
    let shape = src.data_shape();
    let geometry = ProfileGeometry::new(vector, shape[rank - 2], shape[rank - 1], width);

    let data: ArrayData = match src.data().to_numeric() {
        NumericArray::Real(kind, values) => ArrayData::scalar(kind.accumulator(), sample_profiles(&values, &geometry)?),
        NumericArray::Complex(values) => ArrayData::complex(sample_profiles(&values, &geometry)?),
    };

    let intensity = src.intensity_calibration();
    let intensity_calibration = Calibration::new(intensity.offset(), intensity.scale() / width, intensity.units());

    let calibrations = src.dimensional_calibrations();
    let (y_cal, x_cal) = (&calibrations[rank - 2], &calibrations[rank - 1]);
    let profile_calibration = if y_cal.scale() == x_cal.scale() && y_cal.units() == x_cal.units() {
        Calibration::new(0.0, x_cal.scale(), x_cal.units())
    } else {
        log::debug!("line_profile: axes calibrated differently ({y_cal} vs {x_cal}), output uncalibrated");
        Calibration::default()
    };
    let mut dimensional_calibrations = calibrations[..rank - 2].to_vec();
    dimensional_calibrations.push(profile_calibration);

    let reduced = src.data_descriptor().without_axes(&[rank - 2, rank - 1]);
    let descriptor = reduced.with_counts(
        reduced.is_sequence,
        reduced.collection_dimension_count,
        reduced.datum_dimension_count + 1,
    );

    log::debug!(
        "line_profile: {:?} -> {} samples x {} rows",
        shape,
        geometry.length,
        geometry.offsets.len()
    );
    CalibratedArray::derived(src, data, intensity_calibration, dimensional_calibrations, descriptor)
}
