use fringe_grid::{Field2, GridSize};

use crate::error::CloudError;

/// A reconstructed scan with per-point attributes.
///
/// All attribute vectors keep the full grid shape in row-major order, one
/// entry per pixel, so downstream consumers can re-derive 2D adjacency.
/// Masked-out pixels carry NaN attributes and a false mask bit; they are
/// skipped only at export time.
#[derive(Debug, Clone)]
pub struct ScanCloud {
    size: GridSize,
    mask: Field2<bool>,
    points: Vec<[f64; 3]>,
    colors: Vec<[f32; 3]>,
    std: Vec<[f64; 3]>,
    temperature: Option<Vec<f64>>,
    modulation: Vec<f64>,
}

impl ScanCloud {
    /// Get the grid size of the scan.
    #[inline]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Get the number of grid positions, valid or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the scan is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the number of mask-true points, the record count of the export.
    pub fn valid_len(&self) -> usize {
        self.mask.as_slice().iter().filter(|m| **m).count()
    }

    /// Get as reference the validity mask.
    pub fn mask(&self) -> &Field2<bool> {
        &self.mask
    }

    /// Get as reference the point coordinates.
    pub fn points(&self) -> &Vec<[f64; 3]> {
        &self.points
    }

    /// Get as reference the normalized point colors.
    pub fn colors(&self) -> &Vec<[f32; 3]> {
        &self.colors
    }

    /// Get as reference the per-axis standard deviations.
    pub fn std(&self) -> &Vec<[f64; 3]> {
        &self.std
    }

    /// Get as reference the per-point temperatures, when captured.
    pub fn temperature(&self) -> Option<&Vec<f64>> {
        self.temperature.as_ref()
    }

    /// Get as reference the per-point modulation values.
    pub fn modulation(&self) -> &Vec<f64> {
        &self.modulation
    }
}

/// Assemble per-pixel maps into a scan point cloud.
///
/// Variances are converted to standard deviations, colors are normalized to
/// the maximum observed intensity, and every attribute of a masked-out
/// pixel is invalidated with NaN. The grid shape is preserved; nothing is
/// dropped here.
///
/// # Arguments
///
/// * `x`, `y`, `z` - The triangulated coordinate maps.
/// * `color` - The RGB texture image, co-registered with the grid.
/// * `var_x`, `var_y`, `var_z` - The per-axis variance maps.
/// * `modulation` - The fringe modulation map.
/// * `temperature` - Optional per-pixel temperature map.
/// * `mask` - The validity mask.
///
/// # Errors
///
/// Returns an error when any input does not share the mask shape.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    x: &Field2<f64>,
    y: &Field2<f64>,
    z: &Field2<f64>,
    color: &Field2<[f32; 3]>,
    var_x: &Field2<f64>,
    var_y: &Field2<f64>,
    var_z: &Field2<f64>,
    modulation: &Field2<f64>,
    temperature: Option<&Field2<f64>>,
    mask: &Field2<bool>,
) -> Result<ScanCloud, CloudError> {
    mask.check_same_shape(x)?;
    mask.check_same_shape(y)?;
    mask.check_same_shape(z)?;
    mask.check_same_shape(color)?;
    mask.check_same_shape(var_x)?;
    mask.check_same_shape(var_y)?;
    mask.check_same_shape(var_z)?;
    mask.check_same_shape(modulation)?;
    if let Some(temperature) = temperature {
        mask.check_same_shape(temperature)?;
    }

    let mask_data = mask.as_slice();

    let max_intensity = color
        .as_slice()
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::MIN, f32::max);
    let scale = if max_intensity > 0.0 {
        1.0 / max_intensity
    } else {
        1.0
    };

    let points = x
        .as_slice()
        .iter()
        .zip(y.as_slice())
        .zip(z.as_slice())
        .zip(mask_data)
        .map(|(((x, y), z), valid)| {
            if *valid {
                [*x, *y, *z]
            } else {
                [f64::NAN; 3]
            }
        })
        .collect();

    let colors = color
        .as_slice()
        .iter()
        .zip(mask_data)
        .map(|(rgb, valid)| {
            if *valid {
                [rgb[0] * scale, rgb[1] * scale, rgb[2] * scale]
            } else {
                [f32::NAN; 3]
            }
        })
        .collect();

    let std = var_x
        .as_slice()
        .iter()
        .zip(var_y.as_slice())
        .zip(var_z.as_slice())
        .zip(mask_data)
        .map(|(((vx, vy), vz), valid)| {
            if *valid {
                [vx.sqrt(), vy.sqrt(), vz.sqrt()]
            } else {
                [f64::NAN; 3]
            }
        })
        .collect();

    let temperature = temperature.map(|field| {
        field
            .as_slice()
            .iter()
            .zip(mask_data)
            .map(|(t, valid)| if *valid { *t } else { f64::NAN })
            .collect()
    });

    let modulation = modulation
        .as_slice()
        .iter()
        .zip(mask_data)
        .map(|(m, valid)| if *valid { *m } else { f64::NAN })
        .collect();

    Ok(ScanCloud {
        size: mask.size(),
        mask: mask.clone(),
        points,
        colors,
        std,
        temperature,
        modulation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_inputs() -> (
        Field2<f64>,
        Field2<f64>,
        Field2<f64>,
        Field2<[f32; 3]>,
        Field2<f64>,
        Field2<f64>,
        Field2<bool>,
    ) {
        let size = GridSize {
            width: 2,
            height: 2,
        };
        let x = Field2::new(size, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Field2::new(size, vec![-1.0, -2.0, -3.0, -4.0]).unwrap();
        let z = Field2::new(size, vec![700.0, 701.0, 702.0, 703.0]).unwrap();
        let color = Field2::new(
            size,
            vec![
                [50.0, 100.0, 200.0],
                [25.0, 50.0, 100.0],
                [0.0, 0.0, 0.0],
                [200.0, 200.0, 200.0],
            ],
        )
        .unwrap();
        let variance = Field2::new(size, vec![4.0, 9.0, 16.0, 25.0]).unwrap();
        let modulation = Field2::new(size, vec![0.9, 0.8, 0.2, 0.7]).unwrap();
        let mask = Field2::new(size, vec![true, true, false, true]).unwrap();
        (x, y, z, color, variance, modulation, mask)
    }

    #[test]
    fn test_assemble_masks_and_converts() -> Result<(), CloudError> {
        let (x, y, z, color, variance, modulation, mask) = sample_inputs();

        let cloud = assemble(
            &x,
            &y,
            &z,
            &color,
            &variance,
            &variance,
            &variance,
            &modulation,
            None,
            &mask,
        )?;

        assert_eq!(cloud.len(), 4);
        assert_eq!(cloud.valid_len(), 3);

        // masked pixel carries NaN everywhere
        assert!(cloud.points()[2].iter().all(|v| v.is_nan()));
        assert!(cloud.colors()[2].iter().all(|v| v.is_nan()));
        assert!(cloud.std()[2].iter().all(|v| v.is_nan()));
        assert!(cloud.modulation()[2].is_nan());

        // variance became standard deviation
        assert_relative_eq!(cloud.std()[0][0], 2.0);
        assert_relative_eq!(cloud.std()[3][2], 5.0);

        // colors normalized to the maximum observed intensity
        assert_relative_eq!(cloud.colors()[0][2], 1.0);
        assert_relative_eq!(cloud.colors()[1][0], 0.125);
        Ok(())
    }

    #[test]
    fn test_assemble_with_temperature() -> Result<(), CloudError> {
        let (x, y, z, color, variance, modulation, mask) = sample_inputs();
        let temperature = Field2::new(mask.size(), vec![36.5, 36.6, 36.7, 36.8]).unwrap();

        let cloud = assemble(
            &x,
            &y,
            &z,
            &color,
            &variance,
            &variance,
            &variance,
            &modulation,
            Some(&temperature),
            &mask,
        )?;

        let temps = cloud.temperature().unwrap();
        assert_relative_eq!(temps[0], 36.5);
        assert!(temps[2].is_nan());
        Ok(())
    }

    #[test]
    fn test_assemble_shape_mismatch() {
        let (x, y, z, color, variance, modulation, _) = sample_inputs();
        let mask = Field2::from_size_val(
            GridSize {
                width: 3,
                height: 2,
            },
            true,
        );
        let result = assemble(
            &x,
            &y,
            &z,
            &color,
            &variance,
            &variance,
            &variance,
            &modulation,
            None,
            &mask,
        );
        assert!(result.is_err());
    }
}
