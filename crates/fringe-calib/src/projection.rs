use crate::model::Calibration;

/// The derived 3x4 projection matrices of the camera-projector pair.
///
/// The camera is the coordinate-system origin, so its matrix is the
/// intrinsics applied to an identity pose. Both matrices are pure functions
/// of the calibration and are recomputed identically for a given input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionPair {
    /// Camera projection matrix `K_c * [I | 0]`
    pub camera: [[f64; 4]; 3],
    /// Projector projection matrix `K_p * [R | t]`
    pub projector: [[f64; 4]; 3],
}

/// Build the camera and projector projection matrices from a calibration.
///
/// # Arguments
///
/// * `calibration` - The mean calibration parameters.
///
/// # Examples
///
/// ```
/// use fringe_calib::{projection_pair, Calibration, CameraExtrinsics, CameraIntrinsics};
/// # use fringe_calib::{PolynomialDistortion, ProjectionStats};
/// # let intr = CameraIntrinsics { fx: 1000.0, fy: 1000.0, cx: 320.0, cy: 240.0 };
/// # let zero = [[0.0; 4]; 3];
/// # let calibration = Calibration {
/// #     camera: intr, camera_std: intr, distortion: PolynomialDistortion::default(),
/// #     projector: intr, projector_std: intr,
/// #     extrinsics: CameraExtrinsics {
/// #         rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
/// #         translation: [200.0, 0.0, 0.0],
/// #     },
/// #     extrinsics_std: CameraExtrinsics { rotation: [[0.0; 3]; 3], translation: [0.0; 3] },
/// #     projection: ProjectionStats {
/// #         camera_mean: zero, camera_std: zero, projector_mean: zero, projector_std: zero,
/// #     },
/// # };
/// let pair = projection_pair(&calibration);
/// assert_eq!(pair.camera[0][0], 1000.0);
/// assert_eq!(pair.camera[0][3], 0.0);
/// ```
pub fn projection_pair(calibration: &Calibration) -> ProjectionPair {
    let k_c = calibration.camera.matrix();
    let k_p = calibration.projector.matrix();
    let rotation = &calibration.extrinsics.rotation;
    let translation = &calibration.extrinsics.translation;

    let mut camera = [[0.0; 4]; 3];
    for (i, row) in camera.iter_mut().enumerate() {
        row[..3].copy_from_slice(&k_c[i]);
    }

    let mut projector = [[0.0; 4]; 3];
    for (i, row) in projector.iter_mut().enumerate() {
        for j in 0..3 {
            for k in 0..3 {
                row[j] += k_p[i][k] * rotation[k][j];
            }
        }
        for k in 0..3 {
            row[3] += k_p[i][k] * translation[k];
        }
    }

    ProjectionPair { camera, projector }
}
