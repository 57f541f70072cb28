use std::ops::Range;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DataDescriptor – sequence / collection / datum axis roles
// ---------------------------------------------------------------------------

/// Structural classification of an array's axes.
///
/// Axis order is fixed: the sequence axis first (when present), then the
/// collection axes, then the datum axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataDescriptor {
    pub is_sequence: bool,
    pub collection_dimension_count: usize,
    pub datum_dimension_count: usize,
}

impl DataDescriptor {
    pub fn new(is_sequence: bool, collection_dimension_count: usize, datum_dimension_count: usize) -> Self {
        DataDescriptor {
            is_sequence,
            collection_dimension_count,
            datum_dimension_count,
        }
    }

    /// Default policy for unclassified data: the last axis is the signal and
    /// every other axis is a collection axis.
    pub fn default_for_rank(rank: usize) -> Self {
        match rank {
            0 => DataDescriptor::new(false, 0, 0),
            n => DataDescriptor::new(false, n - 1, 1),
        }
    }

    /// Returns a new descriptor with the given counts.
    pub fn with_counts(
        &self,
        is_sequence: bool,
        collection_dimension_count: usize,
        datum_dimension_count: usize,
    ) -> Self {
        DataDescriptor::new(is_sequence, collection_dimension_count, datum_dimension_count)
    }

    pub fn expected_dimension_count(&self) -> usize {
        usize::from(self.is_sequence) + self.collection_dimension_count + self.datum_dimension_count
    }

    pub fn is_collection(&self) -> bool {
        self.collection_dimension_count > 0
    }

    /// Index of the sequence axis, or `None` for non-sequences.
    pub fn sequence_dimension_index(&self) -> Option<usize> {
        self.is_sequence.then_some(0)
    }

    pub fn collection_dimension_indices(&self) -> Range<usize> {
        let start = usize::from(self.is_sequence);
        start..start + self.collection_dimension_count
    }

    pub fn datum_dimension_indices(&self) -> Range<usize> {
        let start = usize::from(self.is_sequence) + self.collection_dimension_count;
        start..start + self.datum_dimension_count
    }

    /// Descriptor after removing `axes`: each removed axis is subtracted from
    /// the role it belonged to; the remaining axes keep theirs.
    ///
    /// Axes beyond the described rank are ignored; callers validate first.
    pub fn without_axes(&self, axes: &[usize]) -> Self {
        let mut is_sequence = self.is_sequence;
        let mut collection = self.collection_dimension_count;
        let mut datum = self.datum_dimension_count;
        let collection_range = self.collection_dimension_indices();
        let datum_range = self.datum_dimension_indices();
        for &axis in axes {
            if self.sequence_dimension_index() == Some(axis) {
                is_sequence = false;
            } else if collection_range.contains(&axis) {
                collection -= 1;
            } else if datum_range.contains(&axis) {
                datum -= 1;
            }
        }
        DataDescriptor::new(is_sequence, collection, datum)
    }
}
