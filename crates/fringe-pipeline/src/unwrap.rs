use serde::{Deserialize, Serialize};

use fringe_grid::{Field2, GridSize};

use crate::config::PatternOrientation;

/// An error type reported by the unwrapping collaborator.
#[derive(thiserror::Error, Debug)]
pub enum UnwrapError {
    /// Error when the frames of one band do not share a shape.
    #[error("Band frames do not share one shape")]
    ShapeMismatch,

    /// Error when the number of wrapped bands does not match the strategy.
    #[error("Expected {expected} wrapped bands, got {found}")]
    BandCount {
        /// The number of bands the unwrap requires
        expected: usize,
        /// The number of bands received
        found: usize,
    },

    /// Error raised by the unwrapping implementation.
    #[error("Unwrapping failed: {0}")]
    Failed(String),
}

/// One decoded phase-shifted band.
#[derive(Clone, Debug)]
pub struct WrappedBand {
    /// Wrapped phase per pixel, in (-pi, pi]
    pub phase: Field2<f64>,
    /// Fringe modulation amplitude per pixel, non-negative
    pub modulation: Field2<f64>,
    /// Average intensity per pixel
    pub average: Field2<f64>,
}

/// An absolute phase map produced by the unwrapping collaborator.
///
/// The mask flags pixels the unwrap considers reliable; it is persisted
/// alongside the phase for reproducibility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnwrappedField {
    /// Unwrapped phase per pixel, arbitrary real range
    pub phase: Field2<f64>,
    /// Unwrap reliability flag per pixel
    pub mask: Field2<bool>,
}

/// The external temporal phase-unwrapping collaborator.
///
/// Phase decoding and unwrapping are outside the reconstruction core; the
/// pipeline slices the captured frames per band, applies the strategy's
/// wrap corrections, and delegates the rest through this trait.
pub trait TemporalUnwrapper {
    /// Decode one band of phase-shifted frames into a wrapped phase and
    /// modulation map.
    fn decode(&self, frames: &[Field2<f64>]) -> Result<WrappedBand, UnwrapError>;

    /// Unwrap a fringe band against a phase-coded reference band.
    fn unwrap_single(
        &self,
        fringe: &WrappedBand,
        reference: &WrappedBand,
        pitch: f64,
        projector_size: GridSize,
        orientation: PatternOrientation,
        kernel: usize,
    ) -> Result<UnwrappedField, UnwrapError>;

    /// Hierarchically unwrap multiple frequency bands, coarsest first.
    fn unwrap_multifreq(
        &self,
        pitches: &[f64],
        phases: &[Field2<f64>],
        kernel: usize,
        orientation: PatternOrientation,
    ) -> Result<UnwrappedField, UnwrapError>;

    /// Unwrap a heterodyne wavelength stack, coarsest first.
    fn unwrap_multiwave(
        &self,
        pitches: &[f64],
        phases: &[Field2<f64>],
        kernel: usize,
        orientation: PatternOrientation,
    ) -> Result<UnwrappedField, UnwrapError>;
}
