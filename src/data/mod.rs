//! Data layer: calibration, axis roles, element storage and the aggregate.
//!
//! Architecture:
//! ```text
//!   raw ndarray + element kind
//!        │
//!        ▼
//!   ┌─────────┐
//!   │ element │  ArrayData: Real / Complex / Rgba
//!   └─────────┘
//!        │        + Calibration per axis (calibration)
//!        │        + DataDescriptor (descriptor)
//!        ▼
//!   ┌─────────────────┐
//!   │ CalibratedArray │  validated at construction, never mutated by transforms
//!   └─────────────────┘
//! ```

pub mod calibration;
pub mod descriptor;
pub mod element;
pub mod model;
