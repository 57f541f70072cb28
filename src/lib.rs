//! Calibrated multi-dimensional data for scientific imaging.
//!
//! Every [`CalibratedArray`] carries a [`Calibration`] per axis, an intensity
//! calibration for its values and a [`DataDescriptor`] sorting its axes into
//! sequence, collection and datum roles. The functions in [`transform`] are
//! pure: each delegates the numeric work to `ndarray` / `rustfft` and derives
//! the output calibration and descriptor from the input's.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod transform;

pub use color::ColorMap;
pub use config::{ComplexDisplay, DisplaySettings};
pub use data::calibration::Calibration;
pub use data::descriptor::DataDescriptor;
pub use data::element::{ArrayData, ElementKind, Rgba, ScalarKind};
pub use data::model::{CalibratedArray, Metadata, MetadataValue};
pub use error::{Result, XDataError};
