use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use ndarray::ArrayViewMutD;
use serde::{Deserialize, Serialize};

use super::calibration::Calibration;
use super::descriptor::DataDescriptor;
use super::element::{ArrayData, ElementKind, Rgba};
use crate::error::{Result, XDataError};

// ---------------------------------------------------------------------------
// MetadataValue – a single opaque metadata entry
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value. Transforms carry metadata through
/// untouched; the crate never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::List(items) => write!(f, "[{} items]", items.len()),
            MetadataValue::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Opaque per-array metadata: key → value.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// CalibratedArray – raw data plus per-axis calibration and axis roles
// ---------------------------------------------------------------------------

/// A dense array with an intensity calibration, one dimensional calibration
/// per axis and a descriptor classifying the axes.
///
/// Invariants, checked at construction:
/// * `dimensional_calibrations.len() == data.ndim()`
/// * `data_descriptor.expected_dimension_count() == data.ndim()`
///
/// The shape is always read from the backing array, so it cannot go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedArray {
    data: ArrayData,
    intensity_calibration: Calibration,
    dimensional_calibrations: Vec<Calibration>,
    data_descriptor: DataDescriptor,
    metadata: Metadata,
    timestamp: SystemTime,
}

impl CalibratedArray {
    /// Build from raw data with explicit calibrations and descriptor.
    ///
    /// Fails with [`XDataError::ConstructionInvariantViolation`] when the
    /// calibration count or the descriptor disagrees with the data rank.
    pub fn new_with_data(
        data: impl Into<ArrayData>,
        intensity_calibration: Calibration,
        dimensional_calibrations: Vec<Calibration>,
        data_descriptor: DataDescriptor,
    ) -> Result<Self> {
        let data = data.into();
        let rank = data.ndim();
        if dimensional_calibrations.len() != rank {
            return Err(XDataError::ConstructionInvariantViolation(format!(
                "{} dimensional calibrations for data of rank {rank}",
                dimensional_calibrations.len()
            )));
        }
        if data_descriptor.expected_dimension_count() != rank {
            return Err(XDataError::ConstructionInvariantViolation(format!(
                "descriptor {data_descriptor:?} describes {} axes but data has rank {rank}",
                data_descriptor.expected_dimension_count()
            )));
        }
        Ok(CalibratedArray {
            data,
            intensity_calibration,
            dimensional_calibrations,
            data_descriptor,
            metadata: Metadata::new(),
            timestamp: SystemTime::now(),
        })
    }

    /// Build from raw data with identity calibrations and the default
    /// descriptor for its rank.
    pub fn from_data(data: impl Into<ArrayData>) -> Self {
        let data = data.into();
        let rank = data.ndim();
        CalibratedArray {
            data,
            intensity_calibration: Calibration::default(),
            dimensional_calibrations: vec![Calibration::default(); rank],
            data_descriptor: DataDescriptor::default_for_rank(rank),
            metadata: Metadata::new(),
            timestamp: SystemTime::now(),
        }
    }

    /// Like [`from_data`](Self::from_data) but with explicit calibrations.
    pub fn from_data_with_calibrations(
        data: impl Into<ArrayData>,
        intensity_calibration: Calibration,
        dimensional_calibrations: Vec<Calibration>,
    ) -> Result<Self> {
        let data = data.into();
        let descriptor = DataDescriptor::default_for_rank(data.ndim());
        Self::new_with_data(data, intensity_calibration, dimensional_calibrations, descriptor)
    }

    /// Build a transform result: validated like [`new_with_data`](Self::new_with_data),
    /// with metadata and timestamp carried over from `source`.
    pub(crate) fn derived(
        source: &CalibratedArray,
        data: ArrayData,
        intensity_calibration: Calibration,
        dimensional_calibrations: Vec<Calibration>,
        data_descriptor: DataDescriptor,
    ) -> Result<Self> {
        let result = Self::new_with_data(data, intensity_calibration, dimensional_calibrations, data_descriptor)?;
        Ok(result
            .with_metadata(source.metadata.clone())
            .with_timestamp(source.timestamp))
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    /// Mutable element access for real data. The shape cannot change through it.
    pub fn real_values_mut(&mut self) -> Option<ArrayViewMutD<'_, f64>> {
        match &mut self.data {
            ArrayData::Real { values, .. } => Some(values.view_mut()),
            _ => None,
        }
    }

    /// Mutable element access for RGBA data. The shape cannot change through it.
    pub fn rgba_values_mut(&mut self) -> Option<ArrayViewMutD<'_, Rgba>> {
        match &mut self.data {
            ArrayData::Rgba(values) => Some(values.view_mut()),
            _ => None,
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        self.data.element_kind()
    }

    pub fn data_shape(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    /// Same as [`data_shape`](Self::data_shape); the shape addressed by the
    /// dimensional calibrations.
    pub fn dimensional_shape(&self) -> Vec<usize> {
        self.data_shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn intensity_calibration(&self) -> &Calibration {
        &self.intensity_calibration
    }

    pub fn dimensional_calibrations(&self) -> &[Calibration] {
        &self.dimensional_calibrations
    }

    pub fn data_descriptor(&self) -> DataDescriptor {
        self.data_descriptor
    }

    pub fn is_sequence(&self) -> bool {
        self.data_descriptor.is_sequence
    }

    pub fn is_collection(&self) -> bool {
        self.data_descriptor.is_collection()
    }

    pub fn collection_dimension_count(&self) -> usize {
        self.data_descriptor.collection_dimension_count
    }

    pub fn datum_dimension_count(&self) -> usize {
        self.data_descriptor.datum_dimension_count
    }

    pub fn collection_dimension_shape(&self) -> Vec<usize> {
        self.data.shape()[self.data_descriptor.collection_dimension_indices()].to_vec()
    }

    pub fn datum_dimension_shape(&self) -> Vec<usize> {
        self.data.shape()[self.data_descriptor.datum_dimension_indices()].to_vec()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
