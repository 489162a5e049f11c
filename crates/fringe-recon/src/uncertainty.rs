use std::f64::consts::PI;

use rayon::prelude::*;

use fringe_calib::ProjectionStats;
use fringe_grid::Field2;

use crate::error::ReconError;
use crate::triangulation::DenseGeometry;

/// Number of retained partial derivatives per output axis.
///
/// Order: `up`, `hc11`, `hc13`, `hc22`, `hc23`, `hc33`, `hp11`, `hp12`,
/// `hp13`, `hp14`, `hp31`, `hp32`, `hp33`, `hp34`.
pub const PARTIAL_COUNT: usize = 14;

/// Variance map and retained partial derivatives of one output axis.
#[derive(Clone, Debug)]
pub struct AxisUncertainty {
    /// Per-pixel coordinate variance; NaN outside the validity mask
    pub variance: Field2<f64>,
    /// Per-pixel partial derivatives in [`PARTIAL_COUNT`] order
    pub partials: Vec<[f64; PARTIAL_COUNT]>,
}

/// First-order uncertainty of a dense reconstruction, one entry per axis.
#[derive(Clone, Debug)]
pub struct Uncertainty {
    /// Uncertainty of the x coordinate map
    pub x: AxisUncertainty,
    /// Uncertainty of the y coordinate map
    pub y: AxisUncertainty,
    /// Uncertainty of the z coordinate map
    pub z: AxisUncertainty,
}

/// The projection-matrix entries that appear in the triangulation formula.
///
/// The camera matrix `K_c * [I | 0]` is zero outside these entries, and only
/// the first and third projector rows enter the 3x3 system.
#[derive(Clone, Copy, Debug)]
struct Entries {
    hc11: f64,
    hc13: f64,
    hc22: f64,
    hc23: f64,
    hc33: f64,
    hp11: f64,
    hp12: f64,
    hp13: f64,
    hp14: f64,
    hp31: f64,
    hp32: f64,
    hp33: f64,
    hp34: f64,
}

impl Entries {
    fn from_matrices(camera: &[[f64; 4]; 3], projector: &[[f64; 4]; 3]) -> Self {
        Self {
            hc11: camera[0][0],
            hc13: camera[0][2],
            hc22: camera[1][1],
            hc23: camera[1][2],
            hc33: camera[2][2],
            hp11: projector[0][0],
            hp12: projector[0][1],
            hp13: projector[0][2],
            hp14: projector[0][3],
            hp31: projector[2][0],
            hp32: projector[2][1],
            hp33: projector[2][2],
            hp34: projector[2][3],
        }
    }
}

/// Entry variances in partial order, excluding the leading `up` slot.
fn entry_variances(stats: &ProjectionStats) -> [f64; PARTIAL_COUNT - 1] {
    let c = &stats.camera_std;
    let p = &stats.projector_std;
    [
        c[0][0] * c[0][0],
        c[0][2] * c[0][2],
        c[1][1] * c[1][1],
        c[1][2] * c[1][2],
        c[2][2] * c[2][2],
        p[0][0] * p[0][0],
        p[0][1] * p[0][1],
        p[0][2] * p[0][2],
        p[0][3] * p[0][3],
        p[2][0] * p[2][0],
        p[2][1] * p[2][1],
        p[2][2] * p[2][2],
        p[2][3] * p[2][3],
    ]
}

/// Determinant of the triangulation system and its gradient.
///
/// With `a1 = hp11 - up*hp31`, `a2 = hp12 - up*hp32`, `a3 = hp13 - up*hp33`,
/// `b1 = hc13 - uc*hc33`, `b2 = hc23 - vc*hc33` the determinant factors as
/// `det = hc11*hc22*a3 - hc22*b1*a1 - hc11*b2*a2`; the gradient follows by
/// differentiating each factor.
fn det_grad(e: &Entries, uc: f64, vc: f64, up: f64) -> (f64, [f64; PARTIAL_COUNT]) {
    let a1 = e.hp11 - up * e.hp31;
    let a2 = e.hp12 - up * e.hp32;
    let a3 = e.hp13 - up * e.hp33;
    let b1 = e.hc13 - uc * e.hc33;
    let b2 = e.hc23 - vc * e.hc33;

    let det = e.hc11 * e.hc22 * a3 - e.hc22 * b1 * a1 - e.hc11 * b2 * a2;

    let grad = [
        -e.hc11 * e.hc22 * e.hp33 + e.hc22 * b1 * e.hp31 + e.hc11 * b2 * e.hp32,
        e.hc22 * a3 - b2 * a2,
        -e.hc22 * a1,
        e.hc11 * a3 - b1 * a1,
        -e.hc11 * a2,
        uc * e.hc22 * a1 + vc * e.hc11 * a2,
        -e.hc22 * b1,
        -e.hc11 * b2,
        e.hc11 * e.hc22,
        0.0,
        up * e.hc22 * b1,
        up * e.hc11 * b2,
        -up * e.hc11 * e.hc22,
        0.0,
    ];

    (det, grad)
}

/// Numerator of the x axis, `hc22*b1*c` with `c = hp14 - up*hp34`.
fn num_grad_x(e: &Entries, uc: f64, up: f64) -> (f64, [f64; PARTIAL_COUNT]) {
    let b1 = e.hc13 - uc * e.hc33;
    let c = e.hp14 - up * e.hp34;

    let num = e.hc22 * b1 * c;

    let mut grad = [0.0; PARTIAL_COUNT];
    grad[0] = -e.hc22 * b1 * e.hp34;
    grad[2] = e.hc22 * c;
    grad[3] = b1 * c;
    grad[5] = -uc * e.hc22 * c;
    grad[9] = e.hc22 * b1;
    grad[13] = -up * e.hc22 * b1;

    (num, grad)
}

/// Numerator of the y axis, `hc11*b2*c`.
fn num_grad_y(e: &Entries, vc: f64, up: f64) -> (f64, [f64; PARTIAL_COUNT]) {
    let b2 = e.hc23 - vc * e.hc33;
    let c = e.hp14 - up * e.hp34;

    let num = e.hc11 * b2 * c;

    let mut grad = [0.0; PARTIAL_COUNT];
    grad[0] = -e.hc11 * b2 * e.hp34;
    grad[1] = b2 * c;
    grad[4] = e.hc11 * c;
    grad[5] = -vc * e.hc11 * c;
    grad[9] = e.hc11 * b2;
    grad[13] = -up * e.hc11 * b2;

    (num, grad)
}

/// Numerator of the z axis, `-hc11*hc22*c`.
fn num_grad_z(e: &Entries, up: f64) -> (f64, [f64; PARTIAL_COUNT]) {
    let c = e.hp14 - up * e.hp34;

    let num = -e.hc11 * e.hc22 * c;

    let mut grad = [0.0; PARTIAL_COUNT];
    grad[0] = e.hc11 * e.hc22 * e.hp34;
    grad[1] = -e.hc22 * c;
    grad[3] = -e.hc11 * c;
    grad[9] = -e.hc11 * e.hc22;
    grad[13] = up * e.hc11 * e.hc22;

    (num, grad)
}

/// Quotient rule for `axis = num/det`, one partial per input variable.
#[inline]
fn quotient_partials(
    det: f64,
    det_grad: &[f64; PARTIAL_COUNT],
    num: f64,
    num_grad: &[f64; PARTIAL_COUNT],
) -> [f64; PARTIAL_COUNT] {
    let det_sq = det * det;
    let mut out = [0.0; PARTIAL_COUNT];
    for i in 0..PARTIAL_COUNT {
        out[i] = (det * num_grad[i] - num * det_grad[i]) / det_sq;
    }
    out
}

#[inline]
fn weighted_sum(
    partials: &[f64; PARTIAL_COUNT],
    sigma_sq_up: f64,
    entry_vars: &[f64; PARTIAL_COUNT - 1],
) -> f64 {
    let mut total = partials[0] * partials[0] * sigma_sq_up;
    for (partial, var) in partials[1..].iter().zip(entry_vars.iter()) {
        total += partial * partial * var;
    }
    total
}

/// Propagate phase and calibration noise to per-axis coordinate variances.
///
/// Treats each output coordinate as a closed-form ratio of the projector
/// column `up` and the 13 projection-matrix entries appearing in the
/// triangulation formula, differentiates the ratio analytically via the
/// quotient rule, and combines the squared partials with the input
/// variances (first-order delta method). Cross-covariances between
/// calibration parameters are neglected; the calibration entries are
/// treated as independent, which is an approximation for correlated
/// parameters.
///
/// The phase noise enters as `sigma_sq_phase = 2*sigma^2 / (N*modulation^2)`
/// scaled to projector-column space. Pixels outside the validity mask get
/// NaN variances; their partials are still evaluated.
///
/// # Arguments
///
/// * `mask` - The validity mask of the reconstruction.
/// * `sigma` - The per-pixel phase-noise standard deviation map.
/// * `modulation` - The per-pixel fringe modulation map.
/// * `geometry` - The per-pixel geometry the solver evaluated.
/// * `stats` - Mean and standard deviation of the projection matrices.
/// * `steps` - Number of phase-shift steps of the finest band.
/// * `pitch` - Fringe spatial period in pixels at the finest level.
///
/// # Errors
///
/// Returns an error when the per-pixel inputs do not share one shape.
pub fn propagate(
    mask: &Field2<bool>,
    sigma: &Field2<f64>,
    modulation: &Field2<f64>,
    geometry: &DenseGeometry,
    stats: &ProjectionStats,
    steps: usize,
    pitch: f64,
) -> Result<Uncertainty, ReconError> {
    mask.check_same_shape(sigma)?;
    mask.check_same_shape(modulation)?;
    mask.check_same_shape(&geometry.uc)?;
    mask.check_same_shape(&geometry.vc)?;
    mask.check_same_shape(&geometry.up)?;

    let entries = Entries::from_matrices(&stats.camera_mean, &stats.projector_mean);
    let entry_vars = entry_variances(stats);
    let n = steps as f64;

    let mask_data = mask.as_slice();
    let sigma_data = sigma.as_slice();
    let mod_data = modulation.as_slice();
    let uc_data = geometry.uc.as_slice();
    let vc_data = geometry.vc.as_slice();
    let up_data = geometry.up.as_slice();

    let per_pixel: Vec<([f64; PARTIAL_COUNT], [f64; PARTIAL_COUNT], [f64; PARTIAL_COUNT], [f64; 3])> =
        (0..mask_data.len())
            .into_par_iter()
            .map(|i| {
                let (uc, vc, up) = (uc_data[i], vc_data[i], up_data[i]);

                let amplitude = if mask_data[i] {
                    mod_data[i]
                } else {
                    f64::NAN
                };
                let s = sigma_data[i];
                let sigma_sq_phase = (2.0 * s * s) / (n * amplitude * amplitude);
                let sigma_sq_up = sigma_sq_phase * pitch * pitch / 4.0 * PI * PI;

                let (det, det_g) = det_grad(&entries, uc, vc, up);

                let (num_x, num_gx) = num_grad_x(&entries, uc, up);
                let px = quotient_partials(det, &det_g, num_x, &num_gx);

                let (num_y, num_gy) = num_grad_y(&entries, vc, up);
                let py = quotient_partials(det, &det_g, num_y, &num_gy);

                let (num_z, num_gz) = num_grad_z(&entries, up);
                let pz = quotient_partials(det, &det_g, num_z, &num_gz);

                let variances = if mask_data[i] {
                    [
                        weighted_sum(&px, sigma_sq_up, &entry_vars),
                        weighted_sum(&py, sigma_sq_up, &entry_vars),
                        weighted_sum(&pz, sigma_sq_up, &entry_vars),
                    ]
                } else {
                    [f64::NAN; 3]
                };

                (px, py, pz, variances)
            })
            .collect();

    let size = mask.size();
    let mut var_x = Field2::from_size_val(size, f64::NAN);
    let mut var_y = Field2::from_size_val(size, f64::NAN);
    let mut var_z = Field2::from_size_val(size, f64::NAN);
    let mut partials_x = Vec::with_capacity(per_pixel.len());
    let mut partials_y = Vec::with_capacity(per_pixel.len());
    let mut partials_z = Vec::with_capacity(per_pixel.len());

    for (i, (px, py, pz, variances)) in per_pixel.into_iter().enumerate() {
        partials_x.push(px);
        partials_y.push(py);
        partials_z.push(pz);
        var_x.as_slice_mut()[i] = variances[0];
        var_y.as_slice_mut()[i] = variances[1];
        var_z.as_slice_mut()[i] = variances[2];
    }

    Ok(Uncertainty {
        x: AxisUncertainty {
            variance: var_x,
            partials: partials_x,
        },
        y: AxisUncertainty {
            variance: var_y,
            partials: partials_y,
        },
        z: AxisUncertainty {
            variance: var_z,
            partials: partials_z,
        },
    })
}
