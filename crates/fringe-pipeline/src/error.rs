use crate::unwrap::UnwrapError;

/// An error type for the pipeline module.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Error when a capture file does not exist.
    #[error("Capture file does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error when a file cannot be read or written.
    #[error("Failed to manipulate the file. {0}")]
    Io(#[from] std::io::Error),

    /// Error when decoding a capture image.
    #[error("Failed to decode the image. {0}")]
    Image(#[from] image::ImageError),

    /// Error when loading the calibration.
    #[error(transparent)]
    Calib(#[from] fringe_calib::CalibError),

    /// Error propagated from the field container.
    #[error(transparent)]
    Field(#[from] fringe_grid::FieldError),

    /// Error propagated from the reconstruction core.
    #[error(transparent)]
    Recon(#[from] fringe_recon::ReconError),

    /// Error propagated from masking and assembly.
    #[error(transparent)]
    Cloud(#[from] fringe_cloud::CloudError),

    /// Error while writing the point cloud file.
    #[error(transparent)]
    Ply(#[from] fringe_cloud::PlyError),

    /// Error reported by the unwrapping collaborator.
    #[error(transparent)]
    Unwrap(#[from] UnwrapError),

    /// Error when parsing the run configuration.
    #[error("Failed to parse the configuration file. {0}")]
    Parse(#[from] serde_json::Error),

    /// Error when persisting an intermediate artifact.
    #[error("Failed to encode intermediate artifact. {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Error when the configured strategy is inconsistent.
    #[error("Invalid unwrapping strategy: {0}")]
    InvalidStrategy(String),

    /// Error when the noise model violates its non-negativity invariant.
    #[error("Noise model contains negative values")]
    InvalidNoiseModel,
}
