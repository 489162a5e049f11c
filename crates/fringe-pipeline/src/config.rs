use std::path::Path;

use serde::{Deserialize, Serialize};

use fringe_grid::GridSize;

use crate::error::PipelineError;

/// Visual orientation of the projected fringe pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternOrientation {
    /// Visually vertical fringes
    Vertical,
    /// Visually horizontal fringes
    Horizontal,
}

/// The temporal unwrapping strategy of a reconstruction run.
///
/// A closed set of variants selected once at run start; each variant
/// carries its own pitch list and per-band step counts, which determine the
/// number of captured frames the run consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum UnwrapStrategy {
    /// Single-frequency unwrap of a fringe pattern against a phase-coded
    /// reference pattern.
    #[serde(rename = "phase")]
    PhaseCoded {
        /// Pixels per fringe period
        pitch: f64,
        /// Phase-shift steps per pattern
        steps: usize,
    },
    /// Hierarchical unwrap of four independently shifted frequency bands,
    /// coarsest first.
    #[serde(rename = "multifreq")]
    MultiFrequency {
        /// Pixels per fringe period, one per band, coarsest first
        pitches: [f64; 4],
        /// Phase-shift steps, one per band
        steps: [usize; 4],
    },
    /// Heterodyne unwrap of three wavelengths combined pairwise into two
    /// synthetic beat wavelengths.
    #[serde(rename = "multiwave")]
    MultiWavelength {
        /// Pixels per fringe period, one per wavelength, coarsest first
        wavelengths: [f64; 3],
        /// Phase-shift steps, one per wavelength
        steps: [usize; 3],
    },
}

impl UnwrapStrategy {
    /// The number of captured frames the strategy consumes.
    pub fn frame_count(&self) -> usize {
        match self {
            Self::PhaseCoded { steps, .. } => 2 * steps,
            Self::MultiFrequency { steps, .. } => steps.iter().sum(),
            Self::MultiWavelength { steps, .. } => steps.iter().sum(),
        }
    }

    /// Pixels per fringe period at the finest level, used for the phase to
    /// coordinate conversion.
    pub fn finest_pitch(&self) -> f64 {
        match self {
            Self::PhaseCoded { pitch, .. } => *pitch,
            Self::MultiFrequency { pitches, .. } => pitches[3],
            Self::MultiWavelength { wavelengths, .. } => wavelengths[2],
        }
    }

    /// Phase-shift steps of the finest band, entering the noise model.
    pub fn finest_steps(&self) -> usize {
        match self {
            Self::PhaseCoded { steps, .. } => *steps,
            Self::MultiFrequency { steps, .. } => steps[3],
            Self::MultiWavelength { steps, .. } => steps[2],
        }
    }

    /// The strategy selector name used for persisted artifacts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhaseCoded { .. } => "phase",
            Self::MultiFrequency { .. } => "multifreq",
            Self::MultiWavelength { .. } => "multiwave",
        }
    }

    /// Check the strategy for internal consistency.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let (pitches, steps): (&[f64], &[usize]) = match self {
            Self::PhaseCoded { pitch, steps } => (std::slice::from_ref(pitch), std::slice::from_ref(steps)),
            Self::MultiFrequency { pitches, steps } => (pitches, steps),
            Self::MultiWavelength { wavelengths, steps } => (wavelengths, steps),
        };
        if steps.iter().any(|s| *s == 0) {
            return Err(PipelineError::InvalidStrategy(
                "step counts must be positive".into(),
            ));
        }
        if pitches.iter().any(|p| *p <= 0.0) {
            return Err(PipelineError::InvalidStrategy(
                "pitches must be positive".into(),
            ));
        }
        if let Self::MultiWavelength { wavelengths, .. } = self {
            if wavelengths[1] == wavelengths[2] {
                return Err(PipelineError::InvalidStrategy(
                    "beat synthesis needs distinct wavelengths".into(),
                ));
            }
            let beat12 = wavelengths[2] * wavelengths[1] / (wavelengths[1] - wavelengths[2]);
            if wavelengths[0] == beat12 {
                return Err(PipelineError::InvalidStrategy(
                    "the coarse wavelength coincides with the first beat".into(),
                ));
            }
        }
        Ok(())
    }
}

/// The configuration surface of a reconstruction run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// The temporal unwrapping strategy
    pub strategy: UnwrapStrategy,
    /// Modulation threshold of the validity mask
    pub modulation_limit: f64,
    /// Phase origin subtracted before the phase to coordinate conversion
    pub phase_offset: f64,
    /// Projector resolution in pixels
    pub projector_size: GridSize,
    /// Visual orientation of the fringe pattern
    pub orientation: PatternOrientation,
    /// Kernel size of the post-unwrap smoothing filter
    #[serde(default = "default_kernel")]
    pub smoothing_kernel: usize,
    /// Include the per-pixel temperature map in the output cloud
    #[serde(default)]
    pub include_temperature: bool,
}

fn default_kernel() -> usize {
    1
}

impl ReconstructionConfig {
    /// Load a run configuration from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::FileDoesNotExist(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.strategy.validate()?;
        Ok(config)
    }
}
