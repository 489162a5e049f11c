/// An error type for the calibration module.
#[derive(thiserror::Error, Debug)]
pub enum CalibError {
    /// Error when the calibration file does not exist.
    #[error("Calibration file does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error when the calibration file cannot be read.
    #[error("Failed to read the calibration file. {0}")]
    Io(#[from] std::io::Error),

    /// Error when the calibration file is malformed.
    #[error("Failed to parse the calibration file. {0}")]
    Parse(#[from] serde_json::Error),
}
