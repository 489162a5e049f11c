#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// reconstruction error types.
pub mod error;

/// closed-form 3x3 matrix inversion.
pub mod inverse3;

/// phase to coordinate triangulation.
pub mod triangulation;

/// first-order uncertainty propagation.
pub mod uncertainty;

pub use error::ReconError;
pub use triangulation::{
    triangulate_dense, triangulate_points, DenseCoordinates, DenseGeometry, TriangulationParams,
};
pub use uncertainty::{propagate, AxisUncertainty, Uncertainty, PARTIAL_COUNT};
