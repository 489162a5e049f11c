use std::f64::consts::PI;

use rayon::prelude::*;

use fringe_grid::Field2;

use crate::error::CloudError;

/// Compute the validity mask from a modulation map.
///
/// A pixel is valid iff its fringe modulation strictly exceeds the limit.
/// NaN modulation never passes the comparison, so already-invalidated
/// pixels stay masked out.
///
/// # Arguments
///
/// * `modulation` - The per-pixel fringe modulation map.
/// * `limit` - The modulation threshold.
pub fn modulation_mask(modulation: &Field2<f64>, limit: f64) -> Field2<bool> {
    modulation.map(|m| *m > limit)
}

/// Invalidate the masked-out entries of a field with NaN.
///
/// Entries are never removed, so the grid shape is preserved end-to-end.
///
/// # Arguments
///
/// * `field` - The field to invalidate in place.
/// * `mask` - The validity mask.
///
/// # Errors
///
/// Returns an error when the mask does not share the field shape.
pub fn mask_field(field: &mut Field2<f64>, mask: &Field2<bool>) -> Result<(), CloudError> {
    field.check_same_shape(mask)?;

    field
        .as_slice_mut()
        .par_iter_mut()
        .zip(mask.as_slice().par_iter())
        .for_each(|(value, valid)| {
            if !valid {
                *value = f64::NAN;
            }
        });

    Ok(())
}

/// Derive the lower modulation limit from the phase-noise model.
///
/// Pixels whose modulation exceeds the returned per-pixel limit unwrap
/// successfully up to the given sigma quantile. The limit follows from the
/// ratio of the two finest fringe levels and the step count of the finest
/// one.
///
/// # Arguments
///
/// * `sigma` - The per-pixel phase-noise standard deviation map.
/// * `quantile_limit` - Sigma level up to which unwrapping must succeed.
/// * `steps` - Phase-shift step counts, one per fringe level.
/// * `pitches` - Pixels per fringe period, one per fringe level.
pub fn modulation_cutoff(
    sigma: &Field2<f64>,
    quantile_limit: f64,
    steps: &[usize],
    pitches: &[f64],
) -> Result<Field2<f64>, CloudError> {
    if pitches.len() < 2 {
        return Err(CloudError::NotEnoughLevels(pitches.len()));
    }
    let last_steps = *steps.last().ok_or(CloudError::EmptySteps)? as f64;

    let pitch_ratio = pitches[pitches.len() - 1] / pitches[pitches.len() - 2];
    let sigma_sq_delta_phi = (PI / quantile_limit).powi(2);

    Ok(sigma.map(|s| {
        let limit_sq = (pitch_ratio + 1.0) * (2.0 * s * s) / (last_steps * sigma_sq_delta_phi);
        limit_sq.sqrt()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fringe_grid::GridSize;

    #[test]
    fn test_modulation_mask_strict_threshold() {
        let modulation = Field2::new(
            GridSize {
                width: 2,
                height: 2,
            },
            vec![0.1, 0.5, 0.5000001, f64::NAN],
        )
        .unwrap();
        let mask = modulation_mask(&modulation, 0.5);
        assert_eq!(mask.as_slice(), &[false, false, true, false]);
    }

    #[test]
    fn test_mask_field_preserves_shape() -> Result<(), CloudError> {
        let size = GridSize {
            width: 3,
            height: 1,
        };
        let mut field = Field2::new(size, vec![1.0, 2.0, 3.0]).unwrap();
        let mask = Field2::new(size, vec![true, false, true]).unwrap();

        mask_field(&mut field, &mask)?;

        assert_eq!(field.len(), 3);
        assert_eq!(field.as_slice()[0], 1.0);
        assert!(field.as_slice()[1].is_nan());
        assert_eq!(field.as_slice()[2], 3.0);
        Ok(())
    }

    #[test]
    fn test_mask_field_shape_mismatch() {
        let mut field = Field2::<f64>::zeros(GridSize {
            width: 2,
            height: 2,
        });
        let mask = Field2::from_size_val(
            GridSize {
                width: 3,
                height: 2,
            },
            true,
        );
        assert!(mask_field(&mut field, &mask).is_err());
    }

    #[test]
    fn test_modulation_cutoff_monotonic_in_sigma() -> Result<(), CloudError> {
        let size = GridSize {
            width: 2,
            height: 1,
        };
        let sigma = Field2::new(size, vec![0.5, 1.5]).unwrap();
        let limit = modulation_cutoff(&sigma, 4.5, &[3, 3, 3, 9], &[1200.0, 120.0, 12.0, 10.0])?;
        assert!(limit.as_slice()[1] > limit.as_slice()[0]);
        Ok(())
    }

    #[test]
    fn test_modulation_cutoff_known_value() -> Result<(), CloudError> {
        let size = GridSize {
            width: 1,
            height: 1,
        };
        let sigma = Field2::new(size, vec![1.0]).unwrap();
        let limit = modulation_cutoff(&sigma, 4.5, &[9], &[120.0, 12.0])?;

        let sigma_sq_delta_phi = (PI / 4.5).powi(2);
        let expected = ((12.0 / 120.0 + 1.0) * 2.0 / (9.0 * sigma_sq_delta_phi)).sqrt();
        assert_relative_eq!(limit.as_slice()[0], expected, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn test_modulation_cutoff_needs_two_levels() {
        let sigma = Field2::<f64>::zeros(GridSize {
            width: 1,
            height: 1,
        });
        let result = modulation_cutoff(&sigma, 4.5, &[9], &[12.0]);
        assert!(matches!(result, Err(CloudError::NotEnoughLevels(1))));
    }
}
