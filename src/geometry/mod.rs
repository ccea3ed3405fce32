//! Transform and projection primitives operating on interleaved xyz coordinates.

pub mod matrix;
pub mod projector;

pub use matrix::*;
pub use projector::*;

/// Immutable 3D point/vector value.
pub type Vector3D = glam::DVec3;
