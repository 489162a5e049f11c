use std::f64::consts::PI;

use rayon::prelude::*;

use fringe_calib::undistort::undistort_point;
use fringe_calib::{CameraIntrinsics, PolynomialDistortion, ProjectionPair};
use fringe_grid::interpolation::bilinear_sample;
use fringe_grid::{Field2, GridSize};

use crate::inverse3::invert3;

/// Parameters of the phase to projector-column conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangulationParams {
    /// Phase origin subtracted before the conversion
    pub phase_offset: f64,
    /// Fringe spatial period in pixels at the finest level
    pub pitch: f64,
}

impl TriangulationParams {
    /// Convert an unwrapped phase value to a projector-column coordinate.
    #[inline]
    pub fn phase_to_column(&self, phase: f64) -> f64 {
        (phase - self.phase_offset) * self.pitch / (2.0 * PI)
    }
}

/// Per-pixel coordinate maps of a dense reconstruction.
#[derive(Clone, Debug)]
pub struct DenseCoordinates {
    /// Per-pixel x coordinate
    pub x: Field2<f64>,
    /// Per-pixel y coordinate
    pub y: Field2<f64>,
    /// Per-pixel z coordinate
    pub z: Field2<f64>,
}

/// The per-pixel observation geometry entering the triangulation formula.
///
/// Holds the undistorted camera coordinates and the projector-column
/// coordinate, so the uncertainty propagation differentiates exactly the
/// formula the solver evaluated.
#[derive(Clone, Debug)]
pub struct DenseGeometry {
    /// Undistorted horizontal pixel coordinate
    pub uc: Field2<f64>,
    /// Undistorted vertical pixel coordinate
    pub vc: Field2<f64>,
    /// Projector-column coordinate derived from the unwrapped phase
    pub up: Field2<f64>,
}

/// Solve one pixel's 3x3 triangulation system.
///
/// Rows subtract the scaled third projection row from the first and second
/// camera rows and the first projector row, eliminating the homogeneous
/// scale factor. Degenerate geometry flows through as Inf/NaN.
#[inline]
fn solve_point(uc: f64, vc: f64, up: f64, cam_h: &[[f64; 4]; 3], proj_h: &[[f64; 4]; 3]) -> [f64; 3] {
    let a = [
        cam_h[0][0] - uc * cam_h[2][0],
        cam_h[0][1] - uc * cam_h[2][1],
        cam_h[0][2] - uc * cam_h[2][2],
        cam_h[1][0] - vc * cam_h[2][0],
        cam_h[1][1] - vc * cam_h[2][1],
        cam_h[1][2] - vc * cam_h[2][2],
        proj_h[0][0] - up * proj_h[2][0],
        proj_h[0][1] - up * proj_h[2][1],
        proj_h[0][2] - up * proj_h[2][2],
    ];

    let b = invert3(&a);

    let c1 = uc * cam_h[2][3] - cam_h[0][3];
    let c2 = vc * cam_h[2][3] - cam_h[1][3];
    let c3 = up * proj_h[2][3] - proj_h[0][3];

    [
        b[0] * c1 + b[1] * c2 + b[2] * c3,
        b[3] * c1 + b[4] * c2 + b[5] * c3,
        b[6] * c1 + b[7] * c2 + b[8] * c3,
    ]
}

/// Triangulate every pixel of an unwrapped phase map.
///
/// For each grid position the observed pixel coordinate is undistorted, the
/// co-registered phase value is converted to a projector-column coordinate,
/// and the closed-form 3x3 system is solved. The output maps share the
/// input shape exactly; no pixel is ever dropped.
///
/// # Arguments
///
/// * `phase` - The unwrapped phase map.
/// * `camera` - The camera intrinsics used for undistortion.
/// * `distortion` - The camera distortion coefficients.
/// * `projections` - The camera and projector projection matrices.
/// * `params` - The phase to projector-column conversion parameters.
///
/// # Returns
///
/// The coordinate maps and the per-pixel geometry they were solved from.
pub fn triangulate_dense(
    phase: &Field2<f64>,
    camera: &CameraIntrinsics,
    distortion: &PolynomialDistortion,
    projections: &ProjectionPair,
    params: &TriangulationParams,
) -> (DenseCoordinates, DenseGeometry) {
    let size = phase.size();
    let width = size.width;

    let mut coords = vec![[f64::NAN; 3]; phase.len()];
    let mut geometry = vec![[0.0f64; 3]; phase.len()];

    coords
        .par_chunks_exact_mut(width)
        .zip(geometry.par_chunks_exact_mut(width))
        .zip(phase.as_slice().par_chunks_exact(width))
        .enumerate()
        .for_each(|(row, ((coord_row, geom_row), phase_row))| {
            for (col, ((coord, geom), &ph)) in coord_row
                .iter_mut()
                .zip(geom_row.iter_mut())
                .zip(phase_row.iter())
                .enumerate()
            {
                let (uc, vc) = undistort_point(col as f64, row as f64, camera, distortion);
                let up = params.phase_to_column(ph);
                *geom = [uc, vc, up];
                *coord = solve_point(uc, vc, up, &projections.camera, &projections.projector);
            }
        });

    let (x, y, z, uc, vc, up) = split_maps(size, &coords, &geometry);

    (
        DenseCoordinates { x, y, z },
        DenseGeometry { uc, vc, up },
    )
}

fn split_maps(
    size: GridSize,
    coords: &[[f64; 3]],
    geometry: &[[f64; 3]],
) -> (
    Field2<f64>,
    Field2<f64>,
    Field2<f64>,
    Field2<f64>,
    Field2<f64>,
    Field2<f64>,
) {
    let mut x = Field2::zeros(size);
    let mut y = Field2::zeros(size);
    let mut z = Field2::zeros(size);
    let mut uc = Field2::zeros(size);
    let mut vc = Field2::zeros(size);
    let mut up = Field2::zeros(size);

    for (i, (coord, geom)) in coords.iter().zip(geometry.iter()).enumerate() {
        x.as_slice_mut()[i] = coord[0];
        y.as_slice_mut()[i] = coord[1];
        z.as_slice_mut()[i] = coord[2];
        uc.as_slice_mut()[i] = geom[0];
        vc.as_slice_mut()[i] = geom[1];
        up.as_slice_mut()[i] = geom[2];
    }

    (x, y, z, uc, vc, up)
}

/// Triangulate a sparse list of 2D query points.
///
/// The same closed-form solve as [`triangulate_dense`], with the phase value
/// sampled bilinearly at each query position. Query points outside the phase
/// map produce NaN coordinates.
///
/// # Arguments
///
/// * `points` - The (x, y) query positions in observed pixel coordinates.
/// * `phase` - The unwrapped phase map to sample.
/// * `camera` - The camera intrinsics used for undistortion.
/// * `distortion` - The camera distortion coefficients.
/// * `projections` - The camera and projector projection matrices.
/// * `params` - The phase to projector-column conversion parameters.
pub fn triangulate_points(
    points: &[[f64; 2]],
    phase: &Field2<f64>,
    camera: &CameraIntrinsics,
    distortion: &PolynomialDistortion,
    projections: &ProjectionPair,
    params: &TriangulationParams,
) -> Vec<[f64; 3]> {
    points
        .par_iter()
        .map(|point| {
            let (uc, vc) = undistort_point(point[0], point[1], camera, distortion);
            let up = params.phase_to_column(bilinear_sample(phase, point[0], point[1]));
            solve_point(uc, vc, up, &projections.camera, &projections.projector)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frontal_projections() -> ProjectionPair {
        // camera at the origin, projector shifted 200mm along x
        ProjectionPair {
            camera: [
                [1000.0, 0.0, 320.0, 0.0],
                [0.0, 1000.0, 240.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
            projector: [
                [900.0, 0.0, 456.0, 900.0 * 200.0],
                [0.0, 900.0, 380.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    fn camera_intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            fx: 1000.0,
            fy: 1000.0,
            cx: 320.0,
            cy: 240.0,
        }
    }

    /// Projector column observed for the world point behind pixel (u, v) on
    /// a frontal plane at depth z0.
    fn plane_column(u: f64, v: f64, z0: f64, pair: &ProjectionPair) -> f64 {
        let x = (u - 320.0) * z0 / 1000.0;
        let y = (v - 240.0) * z0 / 1000.0;
        let p = &pair.projector;
        let num = p[0][0] * x + p[0][1] * y + p[0][2] * z0 + p[0][3];
        let den = p[2][0] * x + p[2][1] * y + p[2][2] * z0 + p[2][3];
        num / den
    }

    #[test]
    fn test_dense_flat_plane_recovery() {
        let pair = frontal_projections();
        let params = TriangulationParams {
            phase_offset: 1.5,
            pitch: 18.0,
        };
        let z0 = 700.0;

        let size = GridSize {
            width: 16,
            height: 12,
        };
        let mut data = Vec::with_capacity(size.width * size.height);
        for v in 0..size.height {
            for u in 0..size.width {
                let up = plane_column(u as f64, v as f64, z0, &pair);
                data.push(params.phase_offset + up * 2.0 * PI / params.pitch);
            }
        }
        let phase = Field2::new(size, data).unwrap();

        let (coords, geometry) = triangulate_dense(
            &phase,
            &camera_intrinsics(),
            &PolynomialDistortion::default(),
            &pair,
            &params,
        );

        assert_eq!(coords.z.size(), size);
        for v in 0..size.height {
            for u in 0..size.width {
                assert_relative_eq!(*coords.z.get(v, u).unwrap(), z0, epsilon = 1e-6);
            }
        }
        // geometry mirrors the inputs with zero distortion
        assert_relative_eq!(*geometry.uc.get(3, 7).unwrap(), 7.0);
        assert_relative_eq!(*geometry.vc.get(3, 7).unwrap(), 3.0);
    }

    #[test]
    fn test_dense_output_shape_matches_input() {
        let pair = frontal_projections();
        let params = TriangulationParams {
            phase_offset: 0.0,
            pitch: 18.0,
        };
        let size = GridSize {
            width: 5,
            height: 9,
        };
        let phase = Field2::from_size_val(size, 1.0);
        let (coords, geometry) = triangulate_dense(
            &phase,
            &camera_intrinsics(),
            &PolynomialDistortion::default(),
            &pair,
            &params,
        );
        assert_eq!(coords.x.size(), size);
        assert_eq!(coords.y.size(), size);
        assert_eq!(coords.z.size(), size);
        assert_eq!(geometry.up.size(), size);
    }

    #[test]
    fn test_sparse_matches_dense_at_grid_points() {
        let pair = frontal_projections();
        let params = TriangulationParams {
            phase_offset: 0.5,
            pitch: 24.0,
        };
        let z0 = 480.0;

        let size = GridSize {
            width: 12,
            height: 10,
        };
        let mut data = Vec::with_capacity(size.width * size.height);
        for v in 0..size.height {
            for u in 0..size.width {
                let up = plane_column(u as f64, v as f64, z0, &pair);
                data.push(params.phase_offset + up * 2.0 * PI / params.pitch);
            }
        }
        let phase = Field2::new(size, data).unwrap();

        let (coords, _) = triangulate_dense(
            &phase,
            &camera_intrinsics(),
            &PolynomialDistortion::default(),
            &pair,
            &params,
        );

        let queries = [[3.0, 2.0], [8.0, 7.0]];
        let sparse = triangulate_points(
            &queries,
            &phase,
            &camera_intrinsics(),
            &PolynomialDistortion::default(),
            &pair,
            &params,
        );

        for (query, point) in queries.iter().zip(sparse.iter()) {
            let (u, v) = (query[0] as usize, query[1] as usize);
            assert_relative_eq!(point[0], *coords.x.get(v, u).unwrap(), epsilon = 1e-9);
            assert_relative_eq!(point[1], *coords.y.get(v, u).unwrap(), epsilon = 1e-9);
            assert_relative_eq!(point[2], *coords.z.get(v, u).unwrap(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sparse_outside_grid_is_nan() {
        let pair = frontal_projections();
        let params = TriangulationParams {
            phase_offset: 0.0,
            pitch: 18.0,
        };
        let phase = Field2::from_size_val(
            GridSize {
                width: 4,
                height: 4,
            },
            1.0,
        );
        let result = triangulate_points(
            &[[100.0, 100.0]],
            &phase,
            &camera_intrinsics(),
            &PolynomialDistortion::default(),
            &pair,
            &params,
        );
        assert!(result[0].iter().all(|v| v.is_nan()));
    }
}
