use crate::model::{CameraIntrinsics, PolynomialDistortion};

/// Number of fixed-point iterations used to invert the distortion model.
const UNDISTORT_ITERATIONS: usize = 5;

/// Distort an ideal pixel coordinate using the polynomial model.
///
/// # Arguments
///
/// * `x` - The x coordinate of the ideal point in pixels.
/// * `y` - The y coordinate of the ideal point in pixels.
/// * `intrinsics` - The intrinsic parameters of the camera.
/// * `distortion` - The distortion parameters of the camera.
///
/// # Returns
///
/// The observed (distorted) pixel coordinate.
pub fn distort_point(
    x: f64,
    y: f64,
    intrinsics: &CameraIntrinsics,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (fx, fy, cx, cy) = (intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy);
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    // normalize the coordinates
    let x = (x - cx) / fx;
    let y = (y - cy) / fy;

    let r2 = x * x + y * y;

    // rational radial distortion
    let kr = (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2)
        / (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2);

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    // denormalize the coordinates
    (fx * xd + cx, fy * yd + cy)
}

/// Compute the ideal pixel coordinate from an observed one.
///
/// Inverts the polynomial distortion model with a fixed number of
/// fixed-point iterations and reprojects through the camera matrix, so the
/// result lives in the same pixel space as the input.
///
/// # Arguments
///
/// * `u` - The x coordinate of the observed point in pixels.
/// * `v` - The y coordinate of the observed point in pixels.
/// * `intrinsics` - The intrinsic parameters of the camera.
/// * `distortion` - The distortion parameters of the camera.
///
/// # Returns
///
/// The undistorted pixel coordinate.
pub fn undistort_point(
    u: f64,
    v: f64,
    intrinsics: &CameraIntrinsics,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (fx, fy, cx, cy) = (intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy);
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    let x_distorted = (u - cx) / fx;
    let y_distorted = (v - cy) / fy;

    let mut x = x_distorted;
    let mut y = y_distorted;

    for _ in 0..UNDISTORT_ITERATIONS {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = (1.0 + k1 * r2 + k2 * r4 + k3 * r6) / (1.0 + k4 * r2 + k5 * r4 + k6 * r6);
        let d_tan_x = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
        let d_tan_y = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

        x = (x_distorted - d_tan_x) / radial;
        y = (y_distorted - d_tan_y) / radial;
    }

    (fx * x + cx, fy * y + cy)
}
