use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use fringe_calib::{projection_pair, Calibration};
use fringe_cloud::{assemble, mask_field, modulation_mask, write_ply};
use fringe_grid::{Field2, GridSize};
use fringe_recon::triangulation::TriangulationParams;
use fringe_recon::{propagate, triangulate_dense};

use crate::capture;
use crate::config::{ReconstructionConfig, UnwrapStrategy};
use crate::error::PipelineError;
use crate::unwrap::{TemporalUnwrapper, UnwrappedField, WrappedBand};

/// Lower bound below which the coarsest multifrequency phase is shifted up
/// one full cycle.
const PHASE_LOWER_BOUND: f64 = -0.5;

/// Upper bound above which the combined beat phase is shifted down one full
/// cycle.
const BEAT_UPPER_BOUND: f64 = 5.5;

/// File name of the exported point cloud, one per output directory.
const CLOUD_FILE: &str = "scan.ply";

/// File name of the optional per-pixel temperature map.
const TEMPERATURE_FILE: &str = "temperature.bin";

/// The outcome of one reconstruction run.
#[derive(Debug, Clone)]
pub struct ReconstructionSummary {
    /// Path of the exported point cloud
    pub cloud_path: PathBuf,
    /// Number of mask-true points in the export
    pub valid_points: usize,
    /// Capture resolution of the run
    pub grid_size: GridSize,
}

/// Drives one reconstruction run from captured frames to a point cloud.
///
/// Owns the immutable run state (configuration, calibration, noise model)
/// and dispatches once on the configured unwrapping strategy. Every run is
/// a pure function of its inputs apart from the persisted artifacts and the
/// final cloud file.
pub struct Reconstructor {
    config: ReconstructionConfig,
    calibration: Calibration,
    noise: Field2<f64>,
}

impl Reconstructor {
    /// Create a reconstructor from already-loaded run state.
    ///
    /// # Errors
    ///
    /// Rejects an inconsistent strategy and a noise model with negative
    /// entries.
    pub fn new(
        config: ReconstructionConfig,
        calibration: Calibration,
        noise: Field2<f64>,
    ) -> Result<Self, PipelineError> {
        config.strategy.validate()?;
        if noise.as_slice().iter().any(|v| *v < 0.0) {
            return Err(PipelineError::InvalidNoiseModel);
        }
        Ok(Self {
            config,
            calibration,
            noise,
        })
    }

    /// Create a reconstructor by loading its state from persisted files.
    ///
    /// # Arguments
    ///
    /// * `config_path` - JSON run configuration.
    /// * `calibration_path` - JSON calibration with per-entry deviations.
    /// * `noise_path` - Binary per-pixel phase-noise map.
    pub fn from_paths(
        config_path: impl AsRef<Path>,
        calibration_path: impl AsRef<Path>,
        noise_path: impl AsRef<Path>,
    ) -> Result<Self, PipelineError> {
        let config = ReconstructionConfig::from_json(config_path)?;
        let calibration = Calibration::from_json(calibration_path)?;
        let noise = fringe_grid::io::read_field(noise_path)?;
        Self::new(config, calibration, noise)
    }

    /// Run the reconstruction and export one point cloud.
    ///
    /// Loads the captured frames and the reference image, dispatches on the
    /// configured strategy, persists the masked modulation map and the
    /// unwrapped phase for reproducibility, then triangulates, propagates
    /// the uncertainty and writes the cloud file.
    ///
    /// # Arguments
    ///
    /// * `unwrapper` - The temporal unwrapping collaborator.
    /// * `capture_dir` - Directory holding the captured frames.
    /// * `output_dir` - Directory receiving the cloud and the artifacts.
    pub fn run(
        &self,
        unwrapper: &dyn TemporalUnwrapper,
        capture_dir: &Path,
        output_dir: &Path,
    ) -> Result<ReconstructionSummary, PipelineError> {
        let name = self.config.strategy.name();
        let frames = capture::load_frames(capture_dir, self.config.strategy.frame_count())?;
        log::info!(
            "reconstructing with the {name} strategy from {} frames",
            frames.len()
        );

        for frame in &frames {
            self.noise.check_same_shape(frame)?;
        }
        let reference = capture::load_reference(capture_dir)?;
        self.noise.check_same_shape(&reference)?;

        let temperature = if self.config.include_temperature {
            let field = fringe_grid::io::read_field(capture_dir.join(TEMPERATURE_FILE))?;
            self.noise.check_same_shape(&field)?;
            Some(field)
        } else {
            None
        };

        let (unwrapped, modulation) = match &self.config.strategy {
            UnwrapStrategy::PhaseCoded { pitch, steps } => {
                self.run_phase_coded(unwrapper, &frames, *pitch, *steps)?
            }
            UnwrapStrategy::MultiFrequency { pitches, steps } => {
                self.run_multifreq(unwrapper, &frames, pitches, steps)?
            }
            UnwrapStrategy::MultiWavelength { wavelengths, steps } => {
                self.run_multiwave(unwrapper, &frames, wavelengths, steps)?
            }
        };
        self.noise.check_same_shape(&unwrapped.phase)?;

        let mask = modulation_mask(&modulation, self.config.modulation_limit);

        // persisted for reproducibility before any triangulation
        let mut masked_modulation = modulation.clone();
        mask_field(&mut masked_modulation, &mask)?;
        fringe_grid::io::write_field(
            output_dir.join(format!("{name}_modulation.bin")),
            &masked_modulation,
        )?;
        let encoded = bincode::serde::encode_to_vec(&unwrapped, bincode::config::standard())?;
        std::fs::write(output_dir.join(format!("{name}_unwrap.bin")), encoded)?;

        let projections = projection_pair(&self.calibration);
        let params = TriangulationParams {
            phase_offset: self.config.phase_offset,
            pitch: self.config.strategy.finest_pitch(),
        };
        let (coords, geometry) = triangulate_dense(
            &unwrapped.phase,
            &self.calibration.camera,
            &self.calibration.distortion,
            &projections,
            &params,
        );
        log::debug!("triangulated {} grid positions", coords.x.len());

        let uncertainty = propagate(
            &mask,
            &self.noise,
            &modulation,
            &geometry,
            &self.calibration.projection,
            self.config.strategy.finest_steps(),
            params.pitch,
        )?;

        let cloud = assemble(
            &coords.x,
            &coords.y,
            &coords.z,
            &reference,
            &uncertainty.x.variance,
            &uncertainty.y.variance,
            &uncertainty.z.variance,
            &modulation,
            temperature.as_ref(),
            &mask,
        )?;

        let cloud_path = output_dir.join(CLOUD_FILE);
        write_ply(&cloud, &cloud_path)?;
        log::info!(
            "wrote {} valid points to {}",
            cloud.valid_len(),
            cloud_path.display()
        );

        Ok(ReconstructionSummary {
            cloud_path,
            valid_points: cloud.valid_len(),
            grid_size: mask.size(),
        })
    }

    fn run_phase_coded(
        &self,
        unwrapper: &dyn TemporalUnwrapper,
        frames: &[Field2<f64>],
        pitch: f64,
        steps: usize,
    ) -> Result<(UnwrappedField, Field2<f64>), PipelineError> {
        let (fringe_frames, step_frames) = frames.split_at(steps);
        let fringe = unwrapper.decode(fringe_frames)?;
        let reference = unwrapper.decode(step_frames)?;

        let unwrapped = unwrapper.unwrap_single(
            &fringe,
            &reference,
            pitch,
            self.config.projector_size,
            self.config.orientation,
            self.config.smoothing_kernel,
        )?;
        Ok((unwrapped, fringe.modulation))
    }

    fn run_multifreq(
        &self,
        unwrapper: &dyn TemporalUnwrapper,
        frames: &[Field2<f64>],
        pitches: &[f64; 4],
        steps: &[usize; 4],
    ) -> Result<(UnwrappedField, Field2<f64>), PipelineError> {
        let mut bands = decode_bands(unwrapper, frames, steps)?;

        // the coarsest band wraps just below zero; shift those pixels up one cycle
        for value in bands[0].phase.as_slice_mut() {
            if *value < PHASE_LOWER_BOUND {
                *value += 2.0 * PI;
            }
        }

        let modulation = bands[3].modulation.clone();
        let phases: Vec<Field2<f64>> = bands.into_iter().map(|band| band.phase).collect();
        let unwrapped = unwrapper.unwrap_multifreq(
            pitches,
            &phases,
            self.config.smoothing_kernel,
            self.config.orientation,
        )?;
        Ok((unwrapped, modulation))
    }

    fn run_multiwave(
        &self,
        unwrapper: &dyn TemporalUnwrapper,
        frames: &[Field2<f64>],
        wavelengths: &[f64; 3],
        steps: &[usize; 3],
    ) -> Result<(UnwrappedField, Field2<f64>), PipelineError> {
        let bands = decode_bands(unwrapper, frames, steps)?;

        // synthetic beat wavelengths from the two finest and all three levels
        let beat12 = wavelengths[2] * wavelengths[1] / (wavelengths[1] - wavelengths[2]);
        let beat123 = wavelengths[0] * beat12 / (wavelengths[0] - beat12);

        let beat12_phase = wrapped_difference(&bands[2].phase, &bands[1].phase)?;
        let mut beat123_phase = wrapped_difference(&beat12_phase, &bands[0].phase)?;
        for value in beat123_phase.as_slice_mut() {
            if *value > BEAT_UPPER_BOUND {
                *value -= 2.0 * PI;
            }
        }

        let pitches = [beat123, wavelengths[0], beat12, wavelengths[1], wavelengths[2]];
        let phases = vec![
            beat123_phase,
            bands[0].phase.clone(),
            beat12_phase,
            bands[1].phase.clone(),
            bands[2].phase.clone(),
        ];
        // texture follows the finest wavelength band, mirroring the
        // multifrequency branch
        let modulation = bands[2].modulation.clone();

        let unwrapped = unwrapper.unwrap_multiwave(
            &pitches,
            &phases,
            self.config.smoothing_kernel,
            self.config.orientation,
        )?;
        Ok((unwrapped, modulation))
    }
}

fn decode_bands(
    unwrapper: &dyn TemporalUnwrapper,
    frames: &[Field2<f64>],
    steps: &[usize],
) -> Result<Vec<WrappedBand>, PipelineError> {
    let mut bands = Vec::with_capacity(steps.len());
    let mut offset = 0;
    for &count in steps {
        let band = unwrapper.decode(&frames[offset..offset + count])?;
        offset += count;
        bands.push(band);
    }
    Ok(bands)
}

fn wrapped_difference(
    a: &Field2<f64>,
    b: &Field2<f64>,
) -> Result<Field2<f64>, PipelineError> {
    a.check_same_shape(b)?;
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(a, b)| (a - b).rem_euclid(2.0 * PI))
        .collect();
    Ok(Field2::new(a.size(), data)?)
}
