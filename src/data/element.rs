use std::fmt;

use ndarray::{ArrayD, Axis};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XDataError};

// ---------------------------------------------------------------------------
// ScalarKind – numeric interpretation of real-valued elements
// ---------------------------------------------------------------------------

/// Numeric interpretation of a real array. Values are always stored as `f64`;
/// the kind records what the acquisition produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    UInt8,
    UInt16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ScalarKind {
    pub fn is_integral(self) -> bool {
        !matches!(self, ScalarKind::Float32 | ScalarKind::Float64)
    }

    /// Kind used to hold a sum of elements of this kind.
    pub fn accumulator(self) -> Self {
        if self.is_integral() {
            ScalarKind::Int64
        } else {
            ScalarKind::Float64
        }
    }

    /// Smallest kind able to represent both operands.
    pub fn promote(self, other: Self) -> Self {
        match (self.is_integral(), other.is_integral()) {
            (true, false) | (false, true) => ScalarKind::Float64,
            _ => self.max(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Rgba – one packed display pixel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// Rec. 709 luma of the colour channels; alpha is ignored.
    pub fn luminance(&self) -> f64 {
        0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// ElementKind – closed tag over everything an array may hold
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Scalar(ScalarKind),
    Complex,
    Rgba,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Scalar(kind) => write!(f, "{kind:?}"),
            ElementKind::Complex => write!(f, "Complex128"),
            ElementKind::Rgba => write!(f, "RGBA"),
        }
    }
}

// ---------------------------------------------------------------------------
// ArrayData – the raw dense array handed to the numeric engine
// ---------------------------------------------------------------------------

/// Raw element storage tagged with its element kind.
///
/// RGBA arrays do not carry the channel axis in their shape: an RGBA image of
/// 32×32 pixels has shape `[32, 32]`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Real { kind: ScalarKind, values: ArrayD<f64> },
    Complex(ArrayD<Complex64>),
    Rgba(ArrayD<Rgba>),
}

/// Real or complex view used by arithmetic transforms. RGBA is converted to
/// luminance on the way in.
#[derive(Debug, Clone)]
pub(crate) enum NumericArray {
    Real(ScalarKind, ArrayD<f64>),
    Complex(ArrayD<Complex64>),
}

/// Applies `$body` to the array inside any variant, keeping the variant and
/// its scalar kind.
macro_rules! map_elements {
    ($data:expr, |$a:ident| $body:expr) => {
        match $data {
            $crate::data::element::ArrayData::Real { kind, values: $a } => {
                $crate::data::element::ArrayData::Real { kind: *kind, values: $body }
            }
            $crate::data::element::ArrayData::Complex($a) => {
                $crate::data::element::ArrayData::Complex($body)
            }
            $crate::data::element::ArrayData::Rgba($a) => $crate::data::element::ArrayData::Rgba($body),
        }
    };
}
pub(crate) use map_elements;

impl ArrayData {
    pub fn real(values: ArrayD<f64>) -> Self {
        ArrayData::Real {
            kind: ScalarKind::Float64,
            values,
        }
    }

    pub fn scalar(kind: ScalarKind, values: ArrayD<f64>) -> Self {
        ArrayData::Real { kind, values }
    }

    pub fn complex(values: ArrayD<Complex64>) -> Self {
        ArrayData::Complex(values)
    }

    pub fn rgba(values: ArrayD<Rgba>) -> Self {
        ArrayData::Rgba(values)
    }

    pub fn from_u8(values: ArrayD<u8>) -> Self {
        ArrayData::Real {
            kind: ScalarKind::UInt8,
            values: values.mapv(f64::from),
        }
    }

    /// Folds a trailing channel axis of length 3 (RGB) or 4 (RGBA) into
    /// [`Rgba`] elements. RGB input gets an opaque alpha.
    pub fn from_rgba_channels(channels: ArrayD<u8>) -> Result<Self> {
        let shape = channels.shape().to_vec();
        let channel_count = match shape.last() {
            Some(&n @ (3 | 4)) => n,
            _ => {
                let mut expected = shape.clone();
                match expected.last_mut() {
                    Some(last) => *last = 4,
                    None => expected.push(4),
                }
                return Err(XDataError::shape_mismatch("from_rgba_channels", &expected, &shape));
            }
        };
        let last = Axis(shape.len() - 1);
        let pixels: Vec<Rgba> = channels
            .lanes(last)
            .into_iter()
            .map(|lane| {
                let alpha = if channel_count == 4 { lane[3] } else { 255 };
                Rgba::new(lane[0], lane[1], lane[2], alpha)
            })
            .collect();
        let values = ArrayD::from_shape_vec(&shape[..shape.len() - 1], pixels)
            .map_err(|_| XDataError::shape_mismatch("from_rgba_channels", &shape, &shape))?;
        Ok(ArrayData::Rgba(values))
    }

    pub fn element_kind(&self) -> ElementKind {
        match self {
            ArrayData::Real { kind, .. } => ElementKind::Scalar(*kind),
            ArrayData::Complex(_) => ElementKind::Complex,
            ArrayData::Rgba(_) => ElementKind::Rgba,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            ArrayData::Real { values, .. } => values.shape(),
            ArrayData::Complex(values) => values.shape(),
            ArrayData::Rgba(values) => values.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_real(&self) -> Option<&ArrayD<f64>> {
        match self {
            ArrayData::Real { values, .. } => Some(values),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ArrayD<Complex64>> {
        match self {
            ArrayData::Complex(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_rgba(&self) -> Option<&ArrayD<Rgba>> {
        match self {
            ArrayData::Rgba(values) => Some(values),
            _ => None,
        }
    }

    /// Real component: values for real data, `re` for complex, luminance for RGBA.
    pub fn real_part(&self) -> ArrayD<f64> {
        match self {
            ArrayData::Real { values, .. } => values.clone(),
            ArrayData::Complex(values) => values.mapv(|z| z.re),
            ArrayData::Rgba(values) => values.mapv(|p| p.luminance()),
        }
    }

    /// Imaginary component; zero for anything that is not complex.
    pub fn imaginary_part(&self) -> ArrayD<f64> {
        match self {
            ArrayData::Complex(values) => values.mapv(|z| z.im),
            other => ArrayD::zeros(other.shape()),
        }
    }

    /// Magnitude-preserving scalar: values for real data, `|z|` for complex,
    /// luminance for RGBA.
    pub fn to_scalar(&self) -> ArrayD<f64> {
        match self {
            ArrayData::Complex(values) => values.mapv(|z| z.norm()),
            other => other.real_part(),
        }
    }

    pub fn to_complex(&self) -> ArrayD<Complex64> {
        match self {
            ArrayData::Complex(values) => values.clone(),
            other => other.real_part().mapv(|v| Complex64::new(v, 0.0)),
        }
    }

    pub(crate) fn to_numeric(&self) -> NumericArray {
        match self {
            ArrayData::Real { kind, values } => NumericArray::Real(*kind, values.clone()),
            ArrayData::Complex(values) => NumericArray::Complex(values.clone()),
            ArrayData::Rgba(values) => {
                NumericArray::Real(ScalarKind::Float64, values.mapv(|p| p.luminance()))
            }
        }
    }
}

impl From<ArrayD<f64>> for ArrayData {
    fn from(values: ArrayD<f64>) -> Self {
        ArrayData::real(values)
    }
}

impl From<ArrayD<Complex64>> for ArrayData {
    fn from(values: ArrayD<Complex64>) -> Self {
        ArrayData::Complex(values)
    }
}

impl From<ArrayD<Rgba>> for ArrayData {
    fn from(values: ArrayD<Rgba>) -> Self {
        ArrayData::Rgba(values)
    }
}

impl From<NumericArray> for ArrayData {
    fn from(numeric: NumericArray) -> Self {
        match numeric {
            NumericArray::Real(kind, values) => ArrayData::Real { kind, values },
            NumericArray::Complex(values) => ArrayData::Complex(values),
        }
    }
}
