#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// calibration error types.
pub mod error;

/// calibration data model.
pub mod model;

/// projection matrix construction.
pub mod projection;

/// pixel coordinate undistortion.
pub mod undistort;

pub use error::CalibError;
pub use model::{
    Calibration, CameraExtrinsics, CameraIntrinsics, PolynomialDistortion, ProjectionStats,
};
pub use projection::{projection_pair, ProjectionPair};
