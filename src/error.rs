use thiserror::Error;

// ---------------------------------------------------------------------------
// XDataError – every failure a transform or factory can report
// ---------------------------------------------------------------------------

/// Errors produced by the factory functions and the transform library.
///
/// All of them are raised before any numeric work is attempted, so a failed
/// call never leaves partially computed output behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XDataError {
    /// Inputs to a multi-array or mask-based operation have incompatible shapes.
    #[error("{operation}: shape mismatch, expected {expected:?} but got {got:?}")]
    ShapeMismatch {
        operation: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// An axis index is out of range, duplicated, or does not fit the descriptor.
    #[error("{operation}: invalid axis {axis}: {reason}")]
    InvalidAxis {
        operation: &'static str,
        axis: usize,
        reason: String,
    },

    /// The factory was given calibrations or a descriptor that disagree with the data rank.
    #[error("cannot construct calibrated array: {0}")]
    ConstructionInvariantViolation(String),

    /// A stacking operation was handed an empty list of arrays.
    #[error("{operation}: no input arrays")]
    EmptyInput { operation: &'static str },
}

impl XDataError {
    pub(crate) fn shape_mismatch(operation: &'static str, expected: &[usize], got: &[usize]) -> Self {
        XDataError::ShapeMismatch {
            operation,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    pub(crate) fn invalid_axis(operation: &'static str, axis: usize, reason: impl Into<String>) -> Self {
        XDataError::InvalidAxis {
            operation,
            axis,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XDataError>;
