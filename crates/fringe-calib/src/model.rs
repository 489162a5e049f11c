use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CalibError;

/// Represents the intrinsic parameters of a pinhole camera or projector
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Returns the intrinsics as a 3x3 camera matrix.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Represents the polynomial distortion parameters of a camera
///
/// Radial coefficients k1..k6 follow the rational model, p1 and p2 are the
/// tangential coefficients. Missing coefficients default to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    #[serde(default)]
    pub k1: f64,
    /// The second radial distortion coefficient
    #[serde(default)]
    pub k2: f64,
    /// The third radial distortion coefficient
    #[serde(default)]
    pub k3: f64,
    /// The fourth radial distortion coefficient
    #[serde(default)]
    pub k4: f64,
    /// The fifth radial distortion coefficient
    #[serde(default)]
    pub k5: f64,
    /// The sixth radial distortion coefficient
    #[serde(default)]
    pub k6: f64,
    /// The first tangential distortion coefficient
    #[serde(default)]
    pub p1: f64,
    /// The second tangential distortion coefficient
    #[serde(default)]
    pub p2: f64,
}

/// Represents the extrinsic transform from the camera to the projector
///
/// # Fields
///
/// * `rotation` - The rotation matrix 3x3
/// * `translation` - The translation vector 3x1
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraExtrinsics {
    /// The rotation matrix 3x3
    pub rotation: [[f64; 3]; 3],
    /// The translation vector 3x1
    pub translation: [f64; 3],
}

/// Mean and standard deviation of the derived projection matrices.
///
/// Standard deviations are estimated across repeated calibrations and feed
/// the calibration-parameter noise model of the uncertainty propagation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionStats {
    /// Mean camera projection matrix 3x4
    pub camera_mean: [[f64; 4]; 3],
    /// Standard deviation of the camera projection matrix entries 3x4
    pub camera_std: [[f64; 4]; 3],
    /// Mean projector projection matrix 3x4
    pub projector_mean: [[f64; 4]; 3],
    /// Standard deviation of the projector projection matrix entries 3x4
    pub projector_std: [[f64; 4]; 3],
}

/// The full calibration state of a camera-projector scanning pair.
///
/// Mean parameters drive the reconstruction; the per-entry standard
/// deviations drive the uncertainty propagation. Immutable once loaded,
/// scoped to one reconstruction run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Camera intrinsic parameters
    pub camera: CameraIntrinsics,
    /// Standard deviation of the camera intrinsic parameters
    pub camera_std: CameraIntrinsics,
    /// Camera lens distortion coefficients
    #[serde(default)]
    pub distortion: PolynomialDistortion,
    /// Projector intrinsic parameters
    pub projector: CameraIntrinsics,
    /// Standard deviation of the projector intrinsic parameters
    pub projector_std: CameraIntrinsics,
    /// Camera to projector extrinsic transform
    pub extrinsics: CameraExtrinsics,
    /// Standard deviation of the extrinsic transform entries
    pub extrinsics_std: CameraExtrinsics,
    /// Mean and standard deviation of the derived projection matrices
    pub projection: ProjectionStats,
}

impl Calibration {
    /// Load a calibration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the persisted calibration.
    ///
    /// # Errors
    ///
    /// A missing or malformed file is a fatal error for the run.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, CalibError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CalibError::FileDoesNotExist(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let calibration = serde_json::from_str(&contents)?;
        Ok(calibration)
    }

    /// Serialize the calibration to a JSON file, overwriting any existing file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<(), CalibError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
