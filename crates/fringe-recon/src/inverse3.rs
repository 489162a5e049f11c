use rayon::prelude::*;

/// Invert a single 3x3 system via the cofactor expansion.
///
/// The matrix is given in row-major order. The inverse is computed from the
/// determinant and the signed cofactors; there is no pivoting and no
/// iterative refinement. A singular or near-singular system produces
/// Inf/NaN entries by IEEE division, which downstream consumers treat as
/// the degeneracy signal.
///
/// # Arguments
///
/// * `a` - The row-major coefficients a11..a33.
///
/// # Returns
///
/// The row-major inverse entries b11..b33.
///
/// Example:
///
/// ```
/// use fringe_recon::inverse3::invert3;
///
/// let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// assert_eq!(invert3(&identity), identity);
/// ```
#[inline]
pub fn invert3(a: &[f64; 9]) -> [f64; 9] {
    let det = a[0] * (a[4] * a[8] - a[5] * a[7])
        + a[1] * (a[5] * a[6] - a[3] * a[8])
        + a[2] * (a[3] * a[7] - a[4] * a[6]);

    [
        (a[4] * a[8] - a[5] * a[7]) / det,
        -(a[1] * a[8] - a[2] * a[7]) / det,
        (a[1] * a[5] - a[2] * a[4]) / det,
        -(a[3] * a[8] - a[5] * a[6]) / det,
        (a[0] * a[8] - a[2] * a[6]) / det,
        -(a[0] * a[5] - a[2] * a[3]) / det,
        (a[3] * a[7] - a[4] * a[6]) / det,
        -(a[0] * a[7] - a[1] * a[6]) / det,
        (a[0] * a[4] - a[1] * a[3]) / det,
    ]
}

/// Invert a batch of 3x3 systems element-wise, one system per position.
///
/// # Arguments
///
/// * `src` - The coefficient systems, one row-major 3x3 matrix per position.
/// * `dst` - A pre-allocated output of the same length.
///
/// PRECONDITION: dst is a pre-allocated slice of the same size as source.
pub fn invert3_batch(src: &[[f64; 9]], dst: &mut [[f64; 9]]) {
    assert_eq!(src.len(), dst.len());

    src.par_iter()
        .zip(dst.par_iter_mut())
        .for_each(|(a, b)| *b = invert3(a));
}
